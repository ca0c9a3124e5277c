//! Tracing setup for the autodeploy binary.
//!
//! Without `RUST_LOG`, autodeploy's own crates log at the requested level
//! while dependencies (surrealdb, reqwest, hyper) stay at `warn`. JSON
//! output carries the enclosing `autodeploy.batch` / `autodeploy.project`
//! span fields on every line so a batch can be filtered by `batch_id`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const OWN_CRATES: [&str; 3] = ["autodeploy", "autodeploy_core", "autodeploy_state"];

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(OWN_CRATES.iter().map(|c| format!("{c}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    installed.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_level_to_own_crates() {
        assert_eq!(
            default_directive(Level::DEBUG),
            "warn,autodeploy=debug,autodeploy_core=debug,autodeploy_state=debug"
        );
    }

    #[test]
    fn test_default_directive_parses() {
        assert!(EnvFilter::try_new(default_directive(Level::INFO)).is_ok());
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
    }
}
