use anyhow::Context;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

use crate::LogLevel;

/// Human-readable subscriber on stderr.  `RUST_LOG` wins over `level`.
pub(crate) fn get_subscriber(level: LogLevel) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let fmt_layer = tracing_subscriber::fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_target(false);

    Registry::default().with(env_filter).with(fmt_layer)
}

pub(crate) fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    set_global_default(subscriber).context("failed to set the global tracing subscriber")
}
