use std::net::TcpListener;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use htcpcp_gateway::{telemetry, ActuatorDriver, Gateway, GatewayConfig};

fn main() -> ExitCode {
    let config = GatewayConfig::parse();

    if let Err(e) = telemetry::initialise(&config.log_filter, config.log_format) {
        eprintln!("htcpcp-gateway: {e}");
        return ExitCode::FAILURE;
    }

    let listener = match TcpListener::bind(config.listen) {
        Ok(listener) => listener,
        Err(e) => {
            error!(listen = %config.listen, error = %e, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let driver = ActuatorDriver::new(config.driver_config());
    info!(
        controller = %driver.config().client.controller_addr,
        unit_id = driver.config().client.unit_id,
        coil_address = driver.config().coil_address,
        "gateway starting"
    );

    Gateway::new(driver).serve(&listener);
    ExitCode::SUCCESS
}
