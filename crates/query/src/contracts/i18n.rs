//! Translation contract

use std::collections::BTreeMap;

/// Resolves a translation key, falling back to `fallback` when unknown
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, values: &BTreeMap<String, String>, fallback: &str) -> String;
}

/// Translator used when the host supplies none: always the fallback text
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl Translator for DefaultTranslator {
    fn translate(&self, _key: &str, _values: &BTreeMap<String, String>, fallback: &str) -> String {
        fallback.to_string()
    }
}
