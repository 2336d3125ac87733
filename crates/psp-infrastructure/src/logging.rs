//! Tracing subscriber setup for binaries and tests embedding PSP.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_directive` (e.g. `"psp_infrastructure=info"`) when
/// `RUST_LOG` is unset or invalid. Returns `false` if a global subscriber was
/// already installed, in which case nothing changes.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_tracing("debug");
        assert!(!init_tracing("debug"));
    }
}
