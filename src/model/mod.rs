pub mod clamp;
pub mod setpoint;
pub mod status;
