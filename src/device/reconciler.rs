use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI16, Ordering};

use crate::error::{BindError, BindResult};
use crate::model::clamp::Clamp;
use crate::model::setpoint::{self, Centi};
use crate::store::{Capability, DeviceStore, STORE_KEY_SETPOINT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Applied(Centi),
    /// Another reconciliation held the guard; the update was dropped
    Busy,
}

/// Holds the reconciliation flag for as long as it lives.
struct ReconcileGuard<'a>(&'a AtomicBool);

impl<'a> ReconcileGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn published_setpoint(store: &dyn DeviceStore) -> Option<Centi> {
    store
        .capability_value(Capability::TargetTemperature)
        .await
        .filter(|celsius| celsius.is_finite())
        .map(Clamp::celsius_to_centi_clamped)
}

/// Owner of the single authoritative setpoint of a device.
///
/// Local writes are clamped into range; externally sourced writes are
/// validated and rejected when out of range. External writes run under a
/// non-blocking guard: a write arriving while another is being applied is
/// dropped rather than queued.
pub struct SetpointReconciler {
    name: String,
    setpoint: AtomicI16,
    busy: AtomicBool,
    store: Arc<dyn DeviceStore>,
}

impl SetpointReconciler {
    /// Initial value: persisted setpoint, then the published capability
    /// value clamped into range, then `default`.
    pub async fn restore(name: &str, store: Arc<dyn DeviceStore>, default: Centi) -> Self {
        let stored = store
            .stored_value(STORE_KEY_SETPOINT)
            .await
            .and_then(|v| i32::try_from(v).ok())
            .and_then(setpoint::validate);

        let value = match stored {
            Some(value) => {
                log::debug!("[{name}] Restored setpoint {value} from store");
                value
            }
            None => match published_setpoint(store.as_ref()).await {
                Some(value) => {
                    log::debug!("[{name}] Restored setpoint {value} from capability");
                    value
                }
                None => {
                    log::info!("[{name}] No previous setpoint, using default {default}");
                    default
                }
            },
        };

        Self {
            name: name.to_string(),
            setpoint: AtomicI16::new(value),
            busy: AtomicBool::new(false),
            store,
        }
    }

    #[must_use]
    pub fn get(&self) -> Centi {
        self.setpoint.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_reconciling(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store, persist and publish. The in-memory value stays committed even
    /// if the store rejects the write.
    async fn commit(&self, value: Centi) {
        self.setpoint.store(value, Ordering::Release);

        if let Err(err) = self
            .store
            .persist(STORE_KEY_SETPOINT, i64::from(value))
            .await
        {
            log::error!("[{}] Failed to persist setpoint {value}: {err}", self.name);
        }

        if let Err(err) = self
            .store
            .publish(Capability::TargetTemperature, setpoint::to_celsius(value))
            .await
        {
            log::error!("[{}] Failed to publish setpoint {value}: {err}", self.name);
        }
    }

    /// Setpoint change requested on the hub side. Never rejected.
    pub async fn set_local(&self, celsius: f64) -> Centi {
        let value = celsius.celsius_to_centi_clamped();
        log::info!(
            "[{}] Local setpoint {:.2}°C ({celsius})",
            self.name,
            setpoint::to_celsius(value)
        );
        self.commit(value).await;
        value
    }

    /// Setpoint reported by the thermostat itself.
    pub async fn apply_external(&self, centi: i32) -> BindResult<Reconciled> {
        let Some(_guard) = ReconcileGuard::acquire(&self.busy) else {
            log::debug!(
                "[{}] Reconciliation in progress, dropping setpoint {centi}",
                self.name
            );
            return Ok(Reconciled::Busy);
        };

        let value = setpoint::validate(centi).ok_or(BindError::SetpointOutOfRange(centi))?;

        log::info!(
            "[{}] External setpoint {:.2}°C -> {:.2}°C",
            self.name,
            setpoint::to_celsius(self.get()),
            setpoint::to_celsius(value)
        );

        self.commit(value).await;

        Ok(Reconciled::Applied(value))
    }
}
