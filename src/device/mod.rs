pub mod identity;
pub mod poller;
pub mod reconciler;
pub mod screen;
pub mod server;
pub mod state;

use std::io::Cursor;
use std::sync::Arc;

use packed_struct::PrimitiveEnum;
use serde_json::Value;

use zcl::attr::{
    ZCL_STATUS_SUCCESS, ZclAttr, ZclCommand, ZclDefaultResp, ZclReadAttr, ZclReadAttrResp,
    ZclReportAttr,
};
use zcl::cluster::measurement::{humidity, power, temperature};
use zcl::cluster::{basic, thermostat, wiser};
use zcl::frame::ZclFrame;

use crate::config::AppConfig;
use crate::device::identity::IdentityResponder;
use crate::device::poller::{DriftPoller, PollContext};
use crate::device::reconciler::{Reconciled, SetpointReconciler};
use crate::device::screen::ScreenState;
use crate::device::server::ThermostatServer;
use crate::device::state::LiveState;
use crate::error::{BindError, BindResult};
use crate::model::clamp::Clamp;
use crate::model::setpoint::{self, Centi};
use crate::model::status::StatusEvent;
use crate::store::{Capability, ClusterEndpoint, DeviceStore};

const HUMIDITY_NOT_AVAILABLE: i64 = 0xFFFF;
const BATTERY_NOT_AVAILABLE: i64 = 0xFF;

/// One bound thermostat.
///
/// Inbound traffic must be delivered one event at a time; the setpoint
/// reconciler relies on that ordering rather than on a lock.
pub struct ThermostatDevice {
    name: String,
    store: Arc<dyn DeviceStore>,
    reconciler: Arc<SetpointReconciler>,
    live: Arc<LiveState>,
    server: ThermostatServer,
    identity: IdentityResponder,
    screen: ScreenState,
    step: Centi,
    poller: Option<DriftPoller>,
}

impl ThermostatDevice {
    pub async fn init(
        conf: &AppConfig,
        store: Arc<dyn DeviceStore>,
        endpoint: Arc<dyn ClusterEndpoint>,
    ) -> Self {
        let tc = &conf.thermostat;
        let name = tc.name.clone();

        let reconciler =
            Arc::new(SetpointReconciler::restore(&name, store.clone(), tc.default_setpoint).await);
        let live = Arc::new(LiveState::new());

        let current = setpoint::to_celsius(reconciler.get());
        if let Err(err) = store.publish(Capability::TargetTemperature, current).await {
            log::error!("[{name}] Failed to publish initial setpoint: {err}");
        }
        if let Err(err) = store.publish(Capability::HeatingDemand, 0.0).await {
            log::error!("[{name}] Failed to publish initial heating demand: {err}");
        }

        let poller = DriftPoller::spawn(
            PollContext {
                endpoint,
                reconciler: reconciler.clone(),
                live: live.clone(),
            },
            tc.poll_interval(),
            tc.read_timeout(),
        );

        log::info!("[{name}] Thermostat ready, setpoint {current:.2}°C");

        Self {
            server: ThermostatServer::new(reconciler.clone(), live.clone()),
            identity: IdentityResponder::new(conf.identity.clone()),
            screen: ScreenState::default(),
            step: tc.setpoint_step,
            poller: Some(poller),
            name,
            store,
            reconciler,
            live,
        }
    }

    #[must_use]
    pub fn setpoint(&self) -> Centi {
        self.reconciler.get()
    }

    #[must_use]
    pub fn live(&self) -> &LiveState {
        &self.live
    }

    /// Handle one inbound zcl frame. Returns the encoded answer, if the
    /// frame calls for one.
    pub async fn handle_frame(&self, cluster: u16, data: &[u8]) -> BindResult<Option<Vec<u8>>> {
        let mut cur = Cursor::new(data);
        let frame = ZclFrame::parse(&mut cur)?;
        let payload = usize::try_from(cur.position())
            .ok()
            .and_then(|pos| data.get(pos..))
            .unwrap_or_default();

        match zcl::cluster::describe(cluster, &frame, payload) {
            Ok(Some(desc)) => log::trace!("[{}] {cluster:04x} {desc}", self.name),
            Ok(None) => log::trace!("[{}] {cluster:04x} {frame:?} {}", self.name, hex::encode(payload)),
            Err(err) => log::trace!("[{}] {cluster:04x} undecodable frame: {err}", self.name),
        }

        if frame.cluster_specific() {
            let status = if cluster == thermostat::CLUSTER_ID {
                self.server.handle_command(&frame, payload).await
            } else {
                log::debug!(
                    "[{}] Ignoring command {:02x} for cluster {cluster:04x}",
                    self.name,
                    frame.cmd
                );
                None
            };

            return match status {
                Some(stat) if frame.wants_default_response() => {
                    Ok(Some(default_response(&frame, stat)?))
                }
                _ => Ok(None),
            };
        }

        match ZclCommand::from_primitive(frame.cmd) {
            Some(ZclCommand::ReadAttrib) => {
                let req = ZclReadAttr::parse(payload)?;
                let attr = match cluster {
                    thermostat::CLUSTER_ID => self.server.read(&req.attr),
                    basic::CLUSTER_ID => self.identity.read(&req.attr),
                    _ => req.attr.iter().map(|id| ZclAttr::unsupported(*id)).collect(),
                };

                let mut out = vec![];
                frame
                    .reply(ZclCommand::ReadAttribResp.to_primitive())
                    .pack(&mut out)?;
                ZclReadAttrResp { attr }.pack(&mut out)?;
                Ok(Some(out))
            }

            Some(ZclCommand::ReportAttrib) => {
                let report = ZclReportAttr::parse(payload)?;
                for attr in &report.attr {
                    self.handle_report(cluster, attr).await;
                }

                if frame.wants_default_response() {
                    Ok(Some(default_response(&frame, ZCL_STATUS_SUCCESS)?))
                } else {
                    Ok(None)
                }
            }

            Some(ZclCommand::DefaultResp) => {
                let resp = ZclDefaultResp::parse(payload)?;
                log::debug!(
                    "[{}] Default response for {:02x}: status {:02x}",
                    self.name,
                    resp.cmd,
                    resp.stat
                );
                Ok(None)
            }

            cmd => {
                log::debug!(
                    "[{}] Unhandled profile command {:?} ({:02x}) on {cluster:04x}",
                    self.name,
                    cmd,
                    frame.cmd
                );
                Ok(None)
            }
        }
    }

    async fn handle_report(&self, cluster: u16, attr: &ZclAttr) {
        let name = &self.name;

        match (cluster, attr.key) {
            (wiser::CLUSTER_ID, wiser::DEVICE_INFO) => {
                let event = StatusEvent::from_attr(&attr.value);
                self.handle_status(event).await;
            }

            (temperature::CLUSTER_ID, temperature::MEASURED_VALUE) => {
                let Some(value) = attr.value.as_i64().and_then(|v| i16::try_from(v).ok()) else {
                    log::warn!("[{name}] Unexpected temperature value {:?}", attr.value);
                    return;
                };
                if !self.live.update_local_temperature(value) {
                    log::debug!("[{name}] Temperature not available");
                    return;
                }
                self.publish(Capability::MeasureTemperature, f64::from(value) / 100.0)
                    .await;
            }

            (humidity::CLUSTER_ID, humidity::MEASURED_VALUE) => match attr.value.as_i64() {
                Some(value) if value != HUMIDITY_NOT_AVAILABLE => {
                    #[allow(clippy::cast_precision_loss)]
                    let percent = value as f64 / 100.0;
                    self.publish(Capability::MeasureHumidity, percent).await;
                }
                _ => log::debug!("[{name}] Humidity not available"),
            },

            (power::CLUSTER_ID, power::BATTERY_PERCENTAGE_REMAINING) => {
                match attr.value.as_i64() {
                    Some(value) if value != BATTERY_NOT_AVAILABLE => {
                        #[allow(clippy::cast_precision_loss)]
                        let percent = value as f64 / 2.0;
                        self.publish(Capability::MeasureBattery, percent).await;
                    }
                    _ => log::debug!("[{name}] Battery level not available"),
                }
            }

            _ => log::trace!("[{name}] Ignoring report {cluster:04x} {attr:?}"),
        }
    }

    async fn publish(&self, cap: Capability, value: f64) {
        if let Err(err) = self.store.publish(cap, value).await {
            log::error!("[{}] Failed to publish {cap}: {err}", self.name);
        }
    }

    async fn apply_external(&self, centi: i32, source: &str) {
        match self.reconciler.apply_external(centi).await {
            Ok(Reconciled::Applied(_) | Reconciled::Busy) => {}
            Err(BindError::SetpointOutOfRange(value)) => {
                log::warn!("[{}] Rejected {source} setpoint {value}", self.name);
            }
            Err(err) => log::error!("[{}] Failed to apply {source} setpoint: {err}", self.name),
        }
    }

    pub async fn handle_status(&self, event: StatusEvent) {
        let name = &self.name;

        match &event {
            StatusEvent::Env {
                setpoint: target,
                temperature,
                humidity,
            } => {
                log::debug!(
                    "[{name}] ENV setpoint {target}, temperature {temperature}, humidity {humidity}"
                );
                if *target == self.reconciler.get() {
                    log::debug!("[{name}] ENV setpoint in sync");
                } else {
                    log::info!("[{name}] Syncing setpoint from ENV");
                    self.apply_external(i32::from(*target), "ENV").await;
                }
            }

            StatusEvent::ScreenWake
            | StatusEvent::ScreenSleep
            | StatusEvent::ButtonPlus
            | StatusEvent::ButtonMinus => {
                match self.screen.on_event(&event, self.step) {
                    Some(delta) => {
                        let target = setpoint::step(self.reconciler.get(), delta);
                        self.apply_external(i32::from(target), "button").await;
                    }
                    None => log::debug!(
                        "[{name}] {event:?}, screen {}",
                        if self.screen.is_awake() { "awake" } else { "asleep" }
                    ),
                }
            }

            StatusEvent::ButtonCenter => {
                log::info!("[{name}] Center button pressed (boost mode is not tracked)");
            }

            StatusEvent::UnknownUi(action) => log::info!("[{name}] Unknown UI action {action:?}"),
            StatusEvent::Ignored => log::trace!("[{name}] Ignored status message"),
            StatusEvent::Invalid => log::warn!("[{name}] Invalid status message"),
        }
    }

    /// Local capability change from the home automation side.
    pub async fn handle_capability(&self, cap: Capability, value: &Value) {
        let name = &self.name;

        match cap {
            Capability::TargetTemperature => {
                if self.reconciler.is_reconciling() {
                    log::debug!("[{name}] Dropping target_temperature echo {value}");
                    return;
                }
                let celsius = capability_number(value).unwrap_or(f64::NAN);
                self.reconciler.set_local(celsius).await;
            }

            Capability::ThermostatMode => match value.as_str() {
                Some("heat") => self.set_heating_demand(100).await,
                Some("off") => self.set_heating_demand(0).await,
                _ => log::warn!("[{name}] Unsupported thermostat mode {value}"),
            },

            Capability::HeatingDemand => match capability_number(value) {
                Some(percent) => self.set_heating_demand(percent.percent_clamped()).await,
                None => log::warn!("[{name}] Invalid heating demand {value}"),
            },

            Capability::MeasureTemperature
            | Capability::MeasureHumidity
            | Capability::MeasureBattery => {
                log::warn!("[{name}] Capability {cap} is read-only");
            }
        }
    }

    async fn set_heating_demand(&self, percent: u8) {
        log::info!("[{}] Heating demand {percent}%", self.name);
        self.live.set_heating_demand(percent);
        self.publish(Capability::HeatingDemand, f64::from(percent)).await;
    }

    pub fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
            log::info!("[{}] Stopped", self.name);
        }
    }
}

/// Numeric capability value. Numbers sent as text are accepted.
fn capability_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .filter(|num: &f64| num.is_finite())
}

fn default_response(frame: &ZclFrame, stat: u8) -> BindResult<Vec<u8>> {
    let mut out = vec![];
    frame
        .reply(ZclCommand::DefaultResp.to_primitive())
        .pack(&mut out)?;
    ZclDefaultResp {
        cmd: frame.cmd,
        stat,
    }
    .pack(&mut out)?;
    Ok(out)
}
