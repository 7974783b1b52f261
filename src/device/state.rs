use std::sync::atomic::{AtomicI16, AtomicU8, Ordering};

use zcl::cluster::measurement::NOT_AVAILABLE;

/// Values served to the thermostat that are not part of the setpoint.
pub struct LiveState {
    heating_demand: AtomicU8,
    local_temperature: AtomicI16,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heating_demand: AtomicU8::new(0),
            local_temperature: AtomicI16::new(NOT_AVAILABLE),
        }
    }

    #[must_use]
    pub fn heating_demand(&self) -> u8 {
        self.heating_demand.load(Ordering::Relaxed)
    }

    pub fn set_heating_demand(&self, percent: u8) {
        self.heating_demand.store(percent.min(100), Ordering::Relaxed);
    }

    /// Cached measured temperature in centi-degrees, if any
    #[must_use]
    pub fn local_temperature(&self) -> Option<i16> {
        match self.local_temperature.load(Ordering::Relaxed) {
            NOT_AVAILABLE => None,
            value => Some(value),
        }
    }

    /// Update the cache. The not-available sentinel leaves it untouched.
    pub fn update_local_temperature(&self, value: i16) -> bool {
        if value == NOT_AVAILABLE {
            return false;
        }
        self.local_temperature.store(value, Ordering::Relaxed);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::device::state::LiveState;

    #[test]
    fn temperature_cache() {
        let live = LiveState::new();
        assert_eq!(live.local_temperature(), None);

        assert!(live.update_local_temperature(2150));
        assert_eq!(live.local_temperature(), Some(2150));

        assert!(!live.update_local_temperature(i16::MIN));
        assert_eq!(live.local_temperature(), Some(2150));
    }

    #[test]
    fn heating_demand_bounded() {
        let live = LiveState::new();
        assert_eq!(live.heating_demand(), 0);
        live.set_heating_demand(250);
        assert_eq!(live.heating_demand(), 100);
    }
}
