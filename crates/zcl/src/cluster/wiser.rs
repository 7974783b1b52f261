//! Wiser device-info cluster (0xFE03).
//!
//! Schneider/Drayton thermostats publish UI events and periodic environment
//! snapshots as a comma-separated text attribute, e.g. `UI,ScreenWake` or
//! `ENV,2000,2150,5000`.

use crate::attr::{ZclCommand, ZclReportAttr};
use crate::error::ZclResult;
use crate::frame::ZclFrame;

pub const CLUSTER_ID: u16 = 0xFE03;

pub const DEVICE_INFO: u16 = 0x0020;

pub fn describe(frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    if frame.cluster_specific() || frame.cmd != ZclCommand::ReportAttrib as u8 {
        return Ok(None);
    }

    let report = ZclReportAttr::parse(data)?;
    let desc = report
        .attr
        .iter()
        .filter(|attr| attr.key == DEVICE_INFO)
        .map(|attr| format!("DeviceInfo {:?}", attr.value))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(Some(desc))
}
