use std::sync::Arc;

use zcl::attr::{ZCL_STATUS_MALFORMED_COMMAND, ZCL_STATUS_SUCCESS, ZclAttr, ZclAttrValue};
use zcl::cluster::measurement::NOT_AVAILABLE;
use zcl::cluster::thermostat::{
    self, SCHNEIDER_MANUFACTURER_ID, SchneiderFipMode, SchneiderSetpoint,
};
use zcl::frame::ZclFrame;

use crate::device::reconciler::{Reconciled, SetpointReconciler};
use crate::device::state::LiveState;
use crate::error::BindError;
use crate::model::setpoint;

/// Fixed cooling values, reported only because the thermostat probes them.
const COOL_SETPOINT_MIN: i16 = 1600;
const COOL_SETPOINT_MAX: i16 = 3200;
const OCCUPIED_COOLING_SETPOINT: i16 = 2600;
const OCCUPIED: u8 = 0x01;

/// Thermostat cluster server answering the bound thermostat.
pub struct ThermostatServer {
    reconciler: Arc<SetpointReconciler>,
    live: Arc<LiveState>,
}

impl ThermostatServer {
    #[must_use]
    pub const fn new(reconciler: Arc<SetpointReconciler>, live: Arc<LiveState>) -> Self {
        Self { reconciler, live }
    }

    #[must_use]
    pub fn read_attribute(&self, id: u16) -> ZclAttrValue {
        match id {
            thermostat::OCCUPIED_HEATING_SETPOINT => ZclAttrValue::I16(self.reconciler.get()),
            thermostat::MIN_HEAT_SETPOINT_LIMIT | thermostat::ABS_MIN_HEAT_SETPOINT_LIMIT => {
                ZclAttrValue::I16(setpoint::MIN)
            }
            thermostat::MAX_HEAT_SETPOINT_LIMIT | thermostat::ABS_MAX_HEAT_SETPOINT_LIMIT => {
                ZclAttrValue::I16(setpoint::MAX)
            }
            thermostat::PI_HEATING_DEMAND => ZclAttrValue::U8(self.live.heating_demand()),
            thermostat::LOCAL_TEMPERATURE => {
                ZclAttrValue::I16(self.live.local_temperature().unwrap_or(NOT_AVAILABLE))
            }
            thermostat::SYSTEM_MODE => ZclAttrValue::E8(thermostat::SYSTEM_MODE_HEAT),
            thermostat::CONTROL_SEQUENCE_OF_OPERATION => {
                ZclAttrValue::E8(thermostat::CONTROL_SEQUENCE_HEATING_ONLY)
            }

            thermostat::OCCUPIED_COOLING_SETPOINT => ZclAttrValue::I16(OCCUPIED_COOLING_SETPOINT),
            thermostat::MIN_COOL_SETPOINT_LIMIT | thermostat::ABS_MIN_COOL_SETPOINT_LIMIT => {
                ZclAttrValue::I16(COOL_SETPOINT_MIN)
            }
            thermostat::MAX_COOL_SETPOINT_LIMIT | thermostat::ABS_MAX_COOL_SETPOINT_LIMIT => {
                ZclAttrValue::I16(COOL_SETPOINT_MAX)
            }
            thermostat::REMOTE_SENSING => ZclAttrValue::B8(0),
            thermostat::OUTDOOR_TEMPERATURE => ZclAttrValue::I16(NOT_AVAILABLE),
            thermostat::OCCUPANCY => ZclAttrValue::B8(OCCUPIED),
            thermostat::PI_COOLING_DEMAND => ZclAttrValue::U8(0),

            _ => ZclAttrValue::Unsupported,
        }
    }

    #[must_use]
    pub fn read(&self, ids: &[u16]) -> Vec<ZclAttr> {
        ids.iter()
            .map(|id| ZclAttr::new(*id, self.read_attribute(*id)))
            .collect()
    }

    /// Handle a cluster specific command. Returns the status to acknowledge
    /// with, or `None` for commands we do not know.
    pub async fn handle_command(&self, frame: &ZclFrame, data: &[u8]) -> Option<u8> {
        let name = self.reconciler.name();

        if frame.mfcode.is_some_and(|code| code != SCHNEIDER_MANUFACTURER_ID) {
            log::debug!(
                "[{name}] Ignoring command {:02x} for manufacturer {:04x?}",
                frame.cmd,
                frame.mfcode
            );
            return None;
        }

        match frame.cmd {
            thermostat::CMD_SCHNEIDER_SETPOINT => {
                let cmd = match SchneiderSetpoint::parse(data) {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        log::warn!("[{name}] Malformed setpoint command {}: {err}", hex::encode(data));
                        return Some(ZCL_STATUS_MALFORMED_COMMAND);
                    }
                };

                log::debug!("[{name}] Setpoint push: {cmd:?}");

                match self.reconciler.apply_external(i32::from(cmd.temperature)).await {
                    Ok(Reconciled::Applied(_) | Reconciled::Busy) => {}
                    Err(BindError::SetpointOutOfRange(value)) => {
                        log::warn!("[{name}] Rejected pushed setpoint {value}");
                    }
                    Err(err) => log::error!("[{name}] Setpoint push failed: {err}"),
                }

                Some(ZCL_STATUS_SUCCESS)
            }

            thermostat::CMD_SCHNEIDER_FIP_MODE => {
                match SchneiderFipMode::parse(data) {
                    Ok(cmd) => log::info!(
                        "[{name}] FIP mode zone:{} mode:{} prio:{}",
                        cmd.zone,
                        cmd.mode,
                        cmd.priority
                    ),
                    Err(err) => {
                        log::warn!("[{name}] Malformed FIP mode command {}: {err}", hex::encode(data));
                        return Some(ZCL_STATUS_MALFORMED_COMMAND);
                    }
                }
                Some(ZCL_STATUS_SUCCESS)
            }

            cmd => {
                log::info!("[{name}] Unknown thermostat command {cmd:02x}: {}", hex::encode(data));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use zcl::attr::{ZCL_STATUS_MALFORMED_COMMAND, ZCL_STATUS_SUCCESS, ZclAttr, ZclAttrValue};
    use zcl::cluster::thermostat::{self, SCHNEIDER_MANUFACTURER_ID};
    use zcl::frame::{ZclFrame, ZclFrameDirection, ZclFrameType};

    use crate::device::reconciler::SetpointReconciler;
    use crate::device::server::ThermostatServer;
    use crate::device::state::LiveState;
    use crate::store::memory::MemoryStore;

    async fn server() -> (ThermostatServer, Arc<SetpointReconciler>, Arc<LiveState>) {
        let store = Arc::new(MemoryStore::default());
        let rec = Arc::new(SetpointReconciler::restore("test", store, 2000).await);
        let live = Arc::new(LiveState::new());
        (ThermostatServer::new(rec.clone(), live.clone()), rec, live)
    }

    fn command(mfcode: Option<u16>, cmd: u8) -> ZclFrame {
        ZclFrame::new(
            ZclFrameType::ClusterSpecific,
            ZclFrameDirection::ClientToServer,
            mfcode,
            1,
            cmd,
        )
    }

    #[tokio::test]
    async fn live_attributes() {
        let (srv, rec, live) = server().await;

        assert_eq!(
            srv.read_attribute(thermostat::OCCUPIED_HEATING_SETPOINT),
            ZclAttrValue::I16(2000)
        );
        assert_eq!(
            srv.read_attribute(thermostat::LOCAL_TEMPERATURE),
            ZclAttrValue::I16(-32768)
        );

        rec.apply_external(2230).await.unwrap();
        live.set_heating_demand(100);
        live.update_local_temperature(1975);

        assert_eq!(
            srv.read(&[
                thermostat::OCCUPIED_HEATING_SETPOINT,
                thermostat::PI_HEATING_DEMAND,
                thermostat::LOCAL_TEMPERATURE,
            ]),
            vec![
                ZclAttr::new(thermostat::OCCUPIED_HEATING_SETPOINT, ZclAttrValue::I16(2230)),
                ZclAttr::new(thermostat::PI_HEATING_DEMAND, ZclAttrValue::U8(100)),
                ZclAttr::new(thermostat::LOCAL_TEMPERATURE, ZclAttrValue::I16(1975)),
            ]
        );
    }

    #[tokio::test]
    async fn constant_attributes() {
        let (srv, _, _) = server().await;

        assert_eq!(
            srv.read_attribute(thermostat::MIN_HEAT_SETPOINT_LIMIT),
            ZclAttrValue::I16(400)
        );
        assert_eq!(
            srv.read_attribute(thermostat::MAX_HEAT_SETPOINT_LIMIT),
            ZclAttrValue::I16(3000)
        );
        assert_eq!(srv.read_attribute(thermostat::SYSTEM_MODE), ZclAttrValue::E8(4));
        assert_eq!(
            srv.read_attribute(thermostat::CONTROL_SEQUENCE_OF_OPERATION),
            ZclAttrValue::E8(2)
        );
        assert_eq!(
            srv.read_attribute(thermostat::OCCUPIED_COOLING_SETPOINT),
            ZclAttrValue::I16(2600)
        );
        assert_eq!(srv.read_attribute(0x4000), ZclAttrValue::Unsupported);
    }

    #[tokio::test]
    async fn setpoint_push() {
        let (srv, rec, _) = server().await;

        let frame = command(Some(SCHNEIDER_MANUFACTURER_ID), thermostat::CMD_SCHNEIDER_SETPOINT);
        let data = hex::decode("000807ff").unwrap();

        assert_eq!(srv.handle_command(&frame, &data).await, Some(ZCL_STATUS_SUCCESS));
        assert_eq!(rec.get(), 1800);
    }

    #[tokio::test]
    async fn setpoint_push_out_of_range() {
        let (srv, rec, _) = server().await;

        let frame = command(Some(SCHNEIDER_MANUFACTURER_ID), thermostat::CMD_SCHNEIDER_SETPOINT);
        let data = hex::decode("00b90bff").unwrap();

        assert_eq!(srv.handle_command(&frame, &data).await, Some(ZCL_STATUS_SUCCESS));
        assert_eq!(rec.get(), 2000);
    }

    #[tokio::test]
    async fn setpoint_push_malformed() {
        let (srv, rec, _) = server().await;

        let frame = command(Some(SCHNEIDER_MANUFACTURER_ID), thermostat::CMD_SCHNEIDER_SETPOINT);

        assert_eq!(
            srv.handle_command(&frame, &[0x00, 0x08]).await,
            Some(ZCL_STATUS_MALFORMED_COMMAND)
        );
        assert_eq!(rec.get(), 2000);
    }

    #[tokio::test]
    async fn other_commands() {
        let (srv, rec, _) = server().await;

        let fip = command(Some(SCHNEIDER_MANUFACTURER_ID), thermostat::CMD_SCHNEIDER_FIP_MODE);
        assert_eq!(
            srv.handle_command(&fip, &[0x01, 0x02, 0x0f, 0xff]).await,
            Some(ZCL_STATUS_SUCCESS)
        );

        let unknown = command(None, 0x42);
        assert_eq!(srv.handle_command(&unknown, &[]).await, None);

        let foreign = command(Some(0x1234), thermostat::CMD_SCHNEIDER_SETPOINT);
        assert_eq!(srv.handle_command(&foreign, &[0x00, 0x08, 0x07, 0xff]).await, None);

        assert_eq!(rec.get(), 2000);
    }
}
