use cloud_log_format::formatter::Formatter;
use cloud_log_format::init::{init_cloud_logging, LayerConfig};
use cloud_log_format::location::current_source_directory;
use tracing::{error, info};

#[derive(Debug)]
struct PaymentDeclined;

impl std::fmt::Display for PaymentDeclined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("card declined by issuer")
    }
}

impl std::error::Error for PaymentDeclined {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LayerConfig {
        formatter: Formatter::from_env().with_trim_filename_prefix(current_source_directory()),
        report_caller: true,
    };
    init_cloud_logging(config)?;

    info!(user_id = 42, "starting checkout");

    let err = PaymentDeclined;
    error!(
        error = &err as &(dyn std::error::Error + 'static),
        order = "A-1001",
        "checkout failed"
    );

    Ok(())
}
