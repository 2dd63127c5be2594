use ::tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing system
///
/// Honours `RUST_LOG` and falls back to `info`. Output goes to stderr in the
/// compact format so it never interleaves with data a host prints to stdout.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    init_with_default("info")
}

/// Initialize the tracing system with an explicit fallback directive
pub fn init_with_default(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for one list query execution
pub fn query_span(key: &str, resource: &str) -> Span {
    span!(Level::DEBUG, "list_query", key = %key, resource = %resource)
}

/// Emit a structured event for query completion
pub fn query_completed(key: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            key = %key,
            duration_ms = %duration_ms,
            "query_completed"
        );
    } else {
        warn!(
            key = %key,
            duration_ms = %duration_ms,
            "query_failed"
        );
    }
}

/// Emit a structured event for cache operations
pub fn cache_event(key: &str, hit: bool, operation: &str) {
    if hit {
        debug!(
            key = %key,
            operation = %operation,
            "cache_hit"
        );
    } else {
        debug!(
            key = %key,
            operation = %operation,
            "cache_miss"
        );
    }
}

/// Emit a structured event when a query is prevented from running
pub fn query_disabled(resource: Option<&str>, reason: &str) {
    info!(
        resource = resource.unwrap_or(""),
        reason = %reason,
        "query_disabled"
    );
}
