pub mod basic;
pub mod measurement;
pub mod standard;
pub mod thermostat;
pub mod wiser;

use crate::error::ZclResult;
use crate::frame::{ZclFrame, ZclFrameType};

/// One-line summary of a frame for trace logging. `Ok(None)` means the
/// frame is not understood by any of the known clusters.
pub fn describe(cluster: u16, frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    if frame.flags.frame_type == ZclFrameType::ProfileWide {
        if cluster == wiser::CLUSTER_ID {
            return wiser::describe(frame, data);
        }
        return standard::describe(frame, data);
    }

    match cluster {
        thermostat::CLUSTER_ID => thermostat::describe(frame, data),
        _ => Ok(None),
    }
}
