//! Thermostat cluster (0x0201), including the Schneider manufacturer-specific
//! commands a bound thermostat sends to its setpoint server.

use packed_struct::prelude::*;
use packed_struct::PackedStructSlice;

use crate::error::{ZclError, ZclResult};
use crate::frame::{ZclFrame, ZclFrameDirection};

pub const CLUSTER_ID: u16 = 0x0201;

pub const SCHNEIDER_MANUFACTURER_ID: u16 = 0x105E;

pub const LOCAL_TEMPERATURE: u16 = 0x0000;
pub const OUTDOOR_TEMPERATURE: u16 = 0x0001;
pub const OCCUPANCY: u16 = 0x0002;
pub const ABS_MIN_HEAT_SETPOINT_LIMIT: u16 = 0x0003;
pub const ABS_MAX_HEAT_SETPOINT_LIMIT: u16 = 0x0004;
pub const ABS_MIN_COOL_SETPOINT_LIMIT: u16 = 0x0005;
pub const ABS_MAX_COOL_SETPOINT_LIMIT: u16 = 0x0006;
pub const PI_COOLING_DEMAND: u16 = 0x0007;
pub const PI_HEATING_DEMAND: u16 = 0x0008;
pub const OCCUPIED_COOLING_SETPOINT: u16 = 0x0011;
pub const OCCUPIED_HEATING_SETPOINT: u16 = 0x0012;
pub const MIN_HEAT_SETPOINT_LIMIT: u16 = 0x0015;
pub const MAX_HEAT_SETPOINT_LIMIT: u16 = 0x0016;
pub const MIN_COOL_SETPOINT_LIMIT: u16 = 0x0017;
pub const MAX_COOL_SETPOINT_LIMIT: u16 = 0x0018;
pub const REMOTE_SENSING: u16 = 0x001A;
pub const CONTROL_SEQUENCE_OF_OPERATION: u16 = 0x001B;
pub const SYSTEM_MODE: u16 = 0x001C;

pub const SYSTEM_MODE_HEAT: u8 = 0x04;
pub const CONTROL_SEQUENCE_HEATING_ONLY: u8 = 0x02;

pub const CMD_SCHNEIDER_SETPOINT: u8 = 0xE0;
pub const CMD_SCHNEIDER_FIP_MODE: u8 = 0xE1;

pub const END_MARKER: u8 = 0xFF;

/// Payload of command 0xE0: the user changed the setpoint on the device.
#[derive(PackedStruct, Debug, Clone, Copy, PartialEq, Eq)]
#[packed_struct(endian = "lsb")]
pub struct SchneiderSetpoint {
    pub zone: u8,
    /// Centi-degrees Celsius
    pub temperature: u16,
    pub end_marker: u8,
}

/// Payload of command 0xE1: pilot-wire (FIP) heating mode change.
#[derive(PackedStruct, Debug, Clone, Copy, PartialEq, Eq)]
#[packed_struct(endian = "lsb")]
pub struct SchneiderFipMode {
    pub zone: u8,
    pub mode: u8,
    pub priority: u8,
    pub end_marker: u8,
}

fn unpack_prefix<T: PackedStructSlice>(data: &[u8]) -> ZclResult<T> {
    let size = T::packed_bytes_size(None)?;
    let head = data.get(..size).ok_or(ZclError::PayloadTooShort {
        expected: size,
        found: data.len(),
    })?;

    Ok(T::unpack_from_slice(head)?)
}

impl SchneiderSetpoint {
    /// Parse from a command payload. Trailing bytes are ignored.
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        unpack_prefix(data)
    }
}

impl SchneiderFipMode {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        unpack_prefix(data)
    }
}

pub fn describe(frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    if !frame.cluster_specific() || frame.flags.direction != ZclFrameDirection::ClientToServer {
        return Ok(None);
    }

    if frame.mfcode != Some(SCHNEIDER_MANUFACTURER_ID) {
        return Ok(None);
    }

    match frame.cmd {
        CMD_SCHNEIDER_SETPOINT => {
            let cmd = SchneiderSetpoint::parse(data)?;
            Ok(Some(format!(
                "SchneiderSetpoint zone:{} temp:{}",
                cmd.zone, cmd.temperature
            )))
        }
        CMD_SCHNEIDER_FIP_MODE => {
            let cmd = SchneiderFipMode::parse(data)?;
            Ok(Some(format!(
                "SchneiderFipMode zone:{} mode:{} prio:{}",
                cmd.zone, cmd.mode, cmd.priority
            )))
        }
        _ => Ok(None),
    }
}
