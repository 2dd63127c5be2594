//! Error types for listwise operations

mod builders;
mod conversions;
mod http;
mod types;

pub use http::HttpError;
pub use types::{Error, Result};
