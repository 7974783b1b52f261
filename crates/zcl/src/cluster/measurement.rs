//! Measurement clusters reported by the thermostat.

pub mod power {
    pub const CLUSTER_ID: u16 = 0x0001;

    /// Battery level in half-percent units (200 = 100%)
    pub const BATTERY_PERCENTAGE_REMAINING: u16 = 0x0021;
}

pub mod temperature {
    pub const CLUSTER_ID: u16 = 0x0402;

    /// Centi-degrees Celsius, `0x8000` when not available
    pub const MEASURED_VALUE: u16 = 0x0000;
}

pub mod humidity {
    pub const CLUSTER_ID: u16 = 0x0405;

    /// Centi-percent relative humidity
    pub const MEASURED_VALUE: u16 = 0x0000;
}

/// ZCL encoding of "value not available" for signed 16-bit measurements
pub const NOT_AVAILABLE: i16 = i16::MIN;
