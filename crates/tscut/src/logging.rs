//! Tracing setup for the binary.
//!
//! Logs go to stderr so `extract` can stream clip bytes to stdout.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` does not say otherwise.
const DEFAULT_DIRECTIVES: &str = "tscut=info,tscut_media=info,tscut_models=info";

/// Whether `LOG_FORMAT` asks for JSON lines.
pub fn json_requested(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Install the global subscriber: colored text for terminals, JSON when
/// `LOG_FORMAT=json`.
pub fn init_tracing() {
    let use_json = json_requested(std::env::var("LOG_FORMAT").ok().as_deref());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_requested() {
        assert!(json_requested(Some("json")));
        assert!(json_requested(Some("JSON")));
        assert!(!json_requested(Some("text")));
        assert!(!json_requested(None));
    }
}
