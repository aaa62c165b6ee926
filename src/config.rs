use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::{info, warn};

use crate::model::Container;
use crate::optimizer::{PackingConfig, SearchBudget};
use crate::types::Vec3;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            engine: EngineConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("BOXFIT_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "⚠️ Could not parse BOXFIT_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("BOXFIT_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "⚠️ BOXFIT_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse BOXFIT_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the packing engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    packing: PackingConfig,
    default_container: Container,
    search_timeout: Option<Duration>,
}

impl EngineConfig {
    const GRID_STEP_VAR: &'static str = "BOXFIT_GRID_STEP";
    const SUPPORT_TOLERANCE_VAR: &'static str = "BOXFIT_SUPPORT_TOLERANCE";
    const GENERAL_EPSILON_VAR: &'static str = "BOXFIT_GENERAL_EPSILON";
    const CONTAINER_WIDTH_VAR: &'static str = "BOXFIT_CONTAINER_WIDTH";
    const CONTAINER_HEIGHT_VAR: &'static str = "BOXFIT_CONTAINER_HEIGHT";
    const CONTAINER_DEPTH_VAR: &'static str = "BOXFIT_CONTAINER_DEPTH";
    const SEARCH_TIMEOUT_VAR: &'static str = "BOXFIT_SEARCH_TIMEOUT_MS";

    pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 5_000;

    /// Creates a configuration from explicit values; `None` disables the
    /// search timeout.
    pub fn new(
        packing: PackingConfig,
        default_container: Container,
        search_timeout: Option<Duration>,
    ) -> Self {
        Self {
            packing,
            default_container,
            search_timeout,
        }
    }

    fn from_env() -> Self {
        let grid_step = load_f64_with_warning(
            Self::GRID_STEP_VAR,
            PackingConfig::DEFAULT_GRID_STEP,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted grid step changes which positions are found",
        );

        let support_tolerance = load_f64_with_warning(
            Self::SUPPORT_TOLERANCE_VAR,
            PackingConfig::DEFAULT_SUPPORT_TOLERANCE,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted support tolerance may let boxes float or reject valid stacks",
        );

        let general_epsilon = load_f64_with_warning(
            Self::GENERAL_EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0 && value.is_finite(),
            "must be greater than 0",
            "Warning: Adjusted general epsilon changes when boxes count as touching",
        );

        let defaults = Container::DEFAULT_DIMS;
        let container_dims = Vec3::new(
            load_positive_dimension(Self::CONTAINER_WIDTH_VAR, defaults.x),
            load_positive_dimension(Self::CONTAINER_HEIGHT_VAR, defaults.y),
            load_positive_dimension(Self::CONTAINER_DEPTH_VAR, defaults.z),
        );
        let default_container = Container::new(container_dims).unwrap_or_default();

        let timeout_ms = load_u64(Self::SEARCH_TIMEOUT_VAR, Self::DEFAULT_SEARCH_TIMEOUT_MS);
        let search_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let packing = PackingConfig::builder()
            .grid_step(grid_step)
            .support_tolerance(support_tolerance)
            .general_epsilon(general_epsilon)
            .build();

        Self::new(packing, default_container, search_timeout)
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }

    /// Container used at startup and after a reset.
    pub fn default_container(&self) -> Container {
        self.default_container
    }

    /// `None` means unlimited.
    pub fn search_timeout(&self) -> Option<Duration> {
        self.search_timeout
    }

    /// A fresh budget for one search.
    pub fn search_budget(&self) -> SearchBudget {
        match self.search_timeout {
            Some(timeout) => SearchBudget::with_timeout(timeout),
            None => SearchBudget::unlimited(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(
            PackingConfig::default(),
            Container::default(),
            Some(Duration::from_millis(Self::DEFAULT_SEARCH_TIMEOUT_MS)),
        )
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_positive_dimension(var_name: &str, default: f64) -> f64 {
    load_f64_with_warning(
        var_name,
        default,
        |value| value > 0.0 && value.is_finite(),
        "must be a positive number",
        "Default container changed",
    )
}

fn load_u64(var_name: &str, default: u64) -> u64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "⚠️ Could not parse {} ('{}') as integer: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_warning(var_name, &raw, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_with_warning(
    var_name: &str,
    raw: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) => {
            if !validator(value) {
                warn!(
                    "⚠️ {} contains invalid value '{}': {}. Using {}.",
                    var_name, raw, invalid_hint, default
                );
                default
            } else {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    info!("⚠️ {} ({} = {}).", warning, var_name, value);
                }
                value
            }
        }
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
