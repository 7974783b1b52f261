use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{BindError, BindResult};
use crate::model::setpoint::{self, Centi};

#[derive(Debug, Clone, Deserialize)]
pub struct ThermobindConfig {
    pub state_file: Utf8PathBuf,
}

/// Tuning for one bound thermostat. Loaded once, never mutated afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct ThermostatConfig {
    pub name: String,
    /// Seconds between drift-correction polls
    pub poll_interval: u64,
    /// Seconds to wait for a remote attribute read
    pub read_timeout: u64,
    /// Centi-degrees added or removed per button press
    pub setpoint_step: Centi,
    /// Centi-degrees used when neither store nor capability has a value
    pub default_setpoint: Centi,
}

impl ThermostatConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            name: "thermostat".to_string(),
            poll_interval: 10 * 60,
            read_timeout: 5,
            setpoint_step: setpoint::STEP,
            default_setpoint: setpoint::DEFAULT,
        }
    }
}

/// Strings returned from the basic cluster when the thermostat probes us.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub manufacturer_name: String,
    pub model_identifier: String,
    pub date_code: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            manufacturer_name: "Thermobind".to_string(),
            model_identifier: "Thermobind Hub".to_string(),
            date_code: "20240101".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub thermobind: ThermobindConfig,
    #[serde(default)]
    pub thermostat: ThermostatConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn validate(&self) -> BindResult<()> {
        let tc = &self.thermostat;

        if tc.read_timeout == 0 || tc.read_timeout >= tc.poll_interval {
            return Err(BindError::InvalidConfig(format!(
                "read_timeout ({}s) must be non-zero and shorter than poll_interval ({}s)",
                tc.read_timeout, tc.poll_interval
            )));
        }

        if tc.setpoint_step <= 0 {
            return Err(BindError::InvalidConfig(format!(
                "setpoint_step must be positive, not {}",
                tc.setpoint_step
            )));
        }

        if !setpoint::in_range(i32::from(tc.default_setpoint)) {
            return Err(BindError::InvalidConfig(format!(
                "default_setpoint {} outside [{}, {}]",
                tc.default_setpoint,
                setpoint::MIN,
                setpoint::MAX
            )));
        }

        Ok(())
    }
}

pub fn parse(filename: &Utf8Path) -> BindResult<AppConfig> {
    let defaults = ThermostatConfig::default();
    let identity = IdentityConfig::default();

    let settings = Config::builder()
        .set_default("thermobind.state_file", "state.yaml")?
        .set_default("thermostat.name", defaults.name)?
        .set_default("thermostat.poll_interval", defaults.poll_interval)?
        .set_default("thermostat.read_timeout", defaults.read_timeout)?
        .set_default("thermostat.setpoint_step", i64::from(defaults.setpoint_step))?
        .set_default("thermostat.default_setpoint", i64::from(defaults.default_setpoint))?
        .set_default("identity.manufacturer_name", identity.manufacturer_name)?
        .set_default("identity.model_identifier", identity.model_identifier)?
        .set_default("identity.date_code", identity.date_code)?
        .add_source(File::with_name(filename.as_str()).required(false))
        .add_source(Environment::with_prefix("THERMOBIND").separator("__"))
        .build()?;

    let conf: AppConfig = settings.try_deserialize()?;
    conf.validate()?;

    Ok(conf)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use camino::Utf8Path;
    use tempfile::NamedTempFile;

    use crate::config;
    use crate::error::BindError;

    fn parse_yaml(yaml: &str) -> Result<config::AppConfig, BindError> {
        let mut tmp = NamedTempFile::with_suffix(".yaml").unwrap();
        tmp.write_all(yaml.as_bytes()).unwrap();
        config::parse(Utf8Path::from_path(tmp.path()).unwrap())
    }

    #[test]
    fn defaults_without_file() {
        let conf = config::parse(Utf8Path::new("/nonexistent/thermobind")).unwrap();

        assert_eq!(conf.thermobind.state_file, "state.yaml");
        assert_eq!(conf.thermostat.poll_interval().as_secs(), 600);
        assert_eq!(conf.thermostat.read_timeout().as_secs(), 5);
        assert_eq!(conf.thermostat.setpoint_step, 50);
        assert_eq!(conf.thermostat.default_setpoint, 2000);
        assert_eq!(conf.identity.date_code, "20240101");
    }

    #[test]
    fn file_overrides() {
        let conf = parse_yaml(
            r"
thermobind:
  state_file: /var/lib/thermobind/living.yaml
thermostat:
  name: living-room
  setpoint_step: 10
identity:
  manufacturer_name: Homey
",
        )
        .unwrap();

        assert_eq!(conf.thermobind.state_file, "/var/lib/thermobind/living.yaml");
        assert_eq!(conf.thermostat.name, "living-room");
        assert_eq!(conf.thermostat.setpoint_step, 10);
        assert_eq!(conf.thermostat.poll_interval, 600);
        assert_eq!(conf.identity.manufacturer_name, "Homey");
        assert_eq!(conf.identity.model_identifier, "Thermobind Hub");
    }

    #[test]
    fn timeout_must_be_shorter_than_poll() {
        let res = parse_yaml(
            r"
thermostat:
  poll_interval: 5
  read_timeout: 5
",
        );
        assert!(matches!(res, Err(BindError::InvalidConfig(_))));
    }

    #[test]
    fn default_setpoint_in_range() {
        let res = parse_yaml(
            r"
thermostat:
  default_setpoint: 3500
",
        );
        assert!(matches!(res, Err(BindError::InvalidConfig(_))));
    }
}
