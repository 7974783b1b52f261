use std::fmt::{self, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use zcl::attr::ZclAttr;

use crate::error::BindResult;

/// Persisted key holding the authoritative setpoint across restarts
pub const STORE_KEY_SETPOINT: &str = "targetSetpointCenti";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TargetTemperature,
    ThermostatMode,
    HeatingDemand,
    MeasureTemperature,
    MeasureHumidity,
    MeasureBattery,
}

impl Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TargetTemperature => "target_temperature",
            Self::ThermostatMode => "thermostat_mode",
            Self::HeatingDemand => "heating_demand",
            Self::MeasureTemperature => "measure_temperature",
            Self::MeasureHumidity => "measure_humidity",
            Self::MeasureBattery => "measure_battery",
        };
        f.write_str(name)
    }
}

/// Persistent key/value state and capability values of one device, as
/// owned by the home automation side.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn stored_value(&self, key: &str) -> Option<i64>;

    async fn capability_value(&self, cap: Capability) -> Option<f64>;

    async fn persist(&self, key: &str, value: i64) -> BindResult<()>;

    async fn publish(&self, cap: Capability, value: f64) -> BindResult<()>;
}

/// Remote side of the zigbee binding.
#[async_trait]
pub trait ClusterEndpoint: Send + Sync {
    /// Read attributes from the remote device. Unbounded; callers apply
    /// their own timeout.
    async fn read_attributes(&self, cluster: u16, attrs: &[u16]) -> BindResult<Vec<ZclAttr>>;
}
