//! Basic cluster (0x0000): identity and liveness attributes.

pub const CLUSTER_ID: u16 = 0x0000;

pub const ZCL_VERSION: u16 = 0x0000;
pub const APPLICATION_VERSION: u16 = 0x0001;
pub const STACK_VERSION: u16 = 0x0002;
pub const HW_VERSION: u16 = 0x0003;
pub const MANUFACTURER_NAME: u16 = 0x0004;
pub const MODEL_IDENTIFIER: u16 = 0x0005;
pub const DATE_CODE: u16 = 0x0006;
pub const POWER_SOURCE: u16 = 0x0007;
pub const LOCATION_DESCRIPTION: u16 = 0x0010;
pub const PHYSICAL_ENVIRONMENT: u16 = 0x0011;
pub const DEVICE_ENABLED: u16 = 0x0012;
pub const ALARM_MASK: u16 = 0x0013;
pub const DISABLE_LOCAL_CONFIG: u16 = 0x0014;
