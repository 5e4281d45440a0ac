use crate::error::InitError;
use crate::formatter::Formatter;
use crate::layer::CloudLogLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the stdout logging layer.
///
/// **Fields**
/// - `formatter`: JSON output settings, see [`Formatter`].
/// - `report_caller`: if `true`, every line carries a
///   `logging.googleapis.com/sourceLocation` object built from the event's
///   module path, file and line.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub formatter: Formatter,
    pub report_caller: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            formatter: Formatter::default(),
            report_caller: true,
        }
    }
}

/// Install a global `tracing` subscriber that prints Cloud Logging JSON
/// lines to stdout.
///
/// **Parameters**
/// - `config`: [`LayerConfig`] controlling the output.
///
/// **Returns**
/// - `Err(InitError::SetGlobalDefault)` if a global subscriber was already
///   installed.
pub fn init_cloud_logging(config: LayerConfig) -> Result<(), InitError> {
    let layer = CloudLogLayer::new(config.formatter, std::io::stdout, config.report_caller);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Equivalent to [`init_cloud_logging`] with [`LayerConfig::default`].
pub fn init_cloud_logging_default() -> Result<(), InitError> {
    init_cloud_logging(LayerConfig::default())
}
