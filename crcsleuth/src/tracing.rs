//! Logging helpers shared by the engine and its front ends.
//!
//! Engine modules import the macros through [`prelude`] so every module logs
//! the same way. The engine itself never installs a subscriber; binaries call
//! [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "CRCSLEUTH_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
}

/// Install a formatting subscriber on stderr.
///
/// Filter directives come from `CRCSLEUTH_LOG` (e.g. `crcsleuth=trace`) and
/// default to `info`. Calling this more than once is harmless; later calls
/// leave the first subscriber in place.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
