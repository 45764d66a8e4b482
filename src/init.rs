use crate::config::Config;
use crate::logger::Logger;
use once_cell::sync::OnceCell;

static ROOT: OnceCell<Logger> = OnceCell::new();

/// Process-wide root logger.
///
/// Built on first use from [`Config::from_env`] unless [`init_root`] ran
/// earlier. Lives for the rest of the process.
pub fn root() -> &'static Logger {
    ROOT.get_or_init(|| Logger::new(Config::from_env()))
}

/// Install `logger` as the root.
///
/// **Returns**
/// - `Ok(&logger)` if no root existed yet.
/// - `Err(logger)` handing the value back if the root was already set,
///   either by an earlier call or by a first use of [`root`].
pub fn init_root(logger: Logger) -> Result<&'static Logger, Logger> {
    ROOT.set(logger)?;
    Ok(root())
}

/// [`Logger::create_logger`] on the root.
pub fn create_logger(
    service: Option<&str>,
    environment: Option<&str>,
    version: Option<&str>,
    category: Option<&str>,
) -> Logger {
    root().create_logger(service, environment, version, category)
}

/// Install a [`BridgeLayer`] writing through `logger` as the global
/// `tracing` subscriber, so `tracing::info!` and friends produce entries.
///
/// **Returns**
/// - `Err(..)` if a global subscriber was already set.
///
/// [`BridgeLayer`]: crate::layer::BridgeLayer
#[cfg(feature = "bridge")]
pub fn install_bridge(logger: Logger) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    let subscriber = Registry::default().with(crate::layer::BridgeLayer::new(logger));
    tracing::subscriber::set_global_default(subscriber)
}
