//! `hdrkit_log` v1:
//! Shared `tracing` subscriber setup for hdrkit front ends.
//!
//! Log lines go to stderr so stdout stays free for command output.
//! `RUST_LOG` takes precedence over the verbosity-derived default.

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Default filter directive for a `-v` count.
///
/// `quiet` wins over any verbosity and keeps errors only.
pub fn derive_filter_directive(n_verbosity: u8, if_quiet: bool) -> &'static str {
    if if_quiet {
        return "error";
    }
    match n_verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(n_verbosity: u8, if_quiet: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(derive_filter_directive(n_verbosity, if_quiet)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::{derive_filter_directive, init_logging};

    #[test]
    fn verbosity_maps_to_directive() {
        assert_eq!(derive_filter_directive(0, false), "warn");
        assert_eq!(derive_filter_directive(1, false), "info");
        assert_eq!(derive_filter_directive(2, false), "debug");
        assert_eq!(derive_filter_directive(7, false), "trace");
        assert_eq!(derive_filter_directive(3, true), "error");
    }

    #[test]
    fn second_init_is_rejected() {
        let _ = init_logging(0, false);
        assert!(init_logging(0, false).is_err());
    }
}
