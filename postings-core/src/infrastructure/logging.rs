use tracing_subscriber::{EnvFilter, fmt};

/// Used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "info,postings_core=debug,postings_cli=debug,sqlx=warn";

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn init_logging() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let subscriber = fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .json()
        .flatten_event(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
