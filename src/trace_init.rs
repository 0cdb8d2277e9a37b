#[cfg(feature = "cli")]
use std::sync::Once;

#[cfg(feature = "cli")]
static INIT: Once = Once::new();

/// Install a stderr fmt subscriber. `RUST_LOG` overrides the default
/// `pinyin_lm=info` filter; `verbose` lowers it to debug.
#[cfg(feature = "cli")]
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let default = if verbose {
            "pinyin_lm=debug"
        } else {
            "pinyin_lm=info"
        };
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
            )
            .init();
    });
}

#[cfg(not(feature = "cli"))]
pub fn init_tracing(_verbose: bool) {}
