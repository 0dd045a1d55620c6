//! Tracing and Sentry setup for front-ends embedding the engine.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ClientConfig;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "qkart_storefront=info,qkart_cli=info";

/// Initialize Sentry (if configured) and the global tracing subscriber.
///
/// Returns the Sentry guard, which must be kept alive for the lifetime of
/// the process. Calling this more than once leaves the first subscriber in
/// place.
#[must_use]
pub fn init(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    // Sentry must be initialized before the tracing subscriber.
    let guard = init_sentry(config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init();

    if result.is_ok() && guard.is_some() {
        tracing::info!("Sentry initialized");
    }
    guard
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    level_filter(*metadata.level())
}

/// Warnings (join misses, duplicate cart entries) are reported as events.
const fn level_filter(level: tracing::Level) -> sentry_tracing::EventFilter {
    match level {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use sentry::integrations::tracing::EventFilter;
    use tracing::Level;

    use super::*;

    fn bits(level: Level) -> u32 {
        level_filter(level).bits()
    }

    #[test]
    fn test_warnings_become_sentry_events() {
        assert_eq!(bits(Level::ERROR), EventFilter::Event.bits());
        assert_eq!(bits(Level::WARN), EventFilter::Event.bits());
    }

    #[test]
    fn test_info_and_debug_become_breadcrumbs() {
        assert_eq!(bits(Level::INFO), EventFilter::Breadcrumb.bits());
        assert_eq!(bits(Level::DEBUG), EventFilter::Breadcrumb.bits());
        assert!(level_filter(Level::TRACE).is_empty());
    }
}
