//! Command-line and environment configuration for the gateway binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::client::ClientConfig;
use crate::driver::{DriverConfig, DEFAULT_COIL_ADDRESS};
use crate::transport::DEFAULT_MODBUS_PORT;

/// Supported log output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON, one event per line.
    Json,
}

/// Gateway configuration, fixed at process start.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "htcpcp-gateway",
    version,
    about = "Translates HTCPCP brew requests into Modbus coil writes"
)]
pub struct GatewayConfig {
    /// Address the HTCPCP listener binds to.
    #[arg(long, env = "HTCPCP_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// IP address of the controller.
    #[arg(long, env = "HTCPCP_CONTROLLER", default_value_t = IpAddr::V4(Ipv4Addr::new(172, 29, 101, 190)))]
    pub controller: IpAddr,

    /// Modbus TCP port of the controller.
    #[arg(long, env = "HTCPCP_CONTROLLER_PORT", default_value_t = DEFAULT_MODBUS_PORT)]
    pub controller_port: u16,

    /// Modbus unit identifier of the controller.
    #[arg(long, env = "HTCPCP_UNIT_ID", default_value_t = 1)]
    pub unit_id: u8,

    /// Address of the brewer coil.
    #[arg(long, env = "HTCPCP_COIL_ADDRESS", default_value_t = DEFAULT_COIL_ADDRESS)]
    pub coil_address: u16,

    /// Controller connect/read/write timeout in milliseconds; 0 waits forever.
    #[arg(long, env = "HTCPCP_TIMEOUT_MS", default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Log filter directive, e.g. `info` or `htcpcp_gateway=debug`.
    #[arg(long, env = "HTCPCP_LOG", default_value = "info")]
    pub log_filter: String,

    /// Log output format.
    #[arg(long, env = "HTCPCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Controller timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Controller connection settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.controller, self.unit_id)
            .with_port(self.controller_port)
            .with_timeout(self.timeout())
    }

    /// Actuator driver settings.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new(self.client_config()).with_coil_address(self.coil_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::try_parse_from(["htcpcp-gateway"]).unwrap();
        assert_eq!(config.listen.to_string(), "127.0.0.1:8080");
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.log_format, LogFormat::Compact);

        let driver = config.driver_config();
        assert_eq!(driver.coil_address, 8225);
        assert_eq!(driver.client.unit_id, 1);
        assert_eq!(driver.client.controller_addr.to_string(), "172.29.101.190:502");
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::try_parse_from([
            "htcpcp-gateway",
            "--listen",
            "0.0.0.0:9090",
            "--controller",
            "10.0.0.5",
            "--controller-port",
            "1502",
            "--unit-id",
            "7",
            "--coil-address",
            "16",
            "--timeout-ms",
            "0",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.listen.port(), 9090);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.log_format, LogFormat::Json);

        let driver = config.driver_config();
        assert_eq!(driver.coil_address, 16);
        assert_eq!(driver.client.unit_id, 7);
        assert_eq!(driver.client.controller_addr.to_string(), "10.0.0.5:1502");
        assert_eq!(driver.client.timeout, None);
    }

    #[test]
    fn test_rejects_invalid_listen_address() {
        assert!(GatewayConfig::try_parse_from(["htcpcp-gateway", "--listen", "nowhere"]).is_err());
    }
}
