//! Tracing and diagnostic-report setup.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber and miette's panic hook.
///
/// The filter comes from `RUST_LOG` when set, defaulting to `info` for this
/// crate and `warn` elsewhere. Safe to call more than once; only the first
/// call installs.
pub fn init() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,floweave=info"))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .with(ErrorLayer::default())
            .init();

        miette::set_panic_hook();
    });
}
