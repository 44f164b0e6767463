use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::listing::{
    METRIC_MAX_PAGE_REFRESH, METRIC_OUT_OF_RANGE, METRIC_PAGE_HIT, METRIC_PAGE_MISS,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_PAGE_HIT,
            Unit::Count,
            "Listing pages served from the cache."
        );
        describe_counter!(
            METRIC_PAGE_MISS,
            Unit::Count,
            "Listing pages recomputed from the article store."
        );
        describe_counter!(
            METRIC_OUT_OF_RANGE,
            Unit::Count,
            "Listing requests short-circuited by the cached max-page bound."
        );
        describe_counter!(
            METRIC_MAX_PAGE_REFRESH,
            Unit::Count,
            "Max-page recomputations from the article store."
        );
    });
}
