use std::sync::atomic::{AtomicBool, Ordering};

use crate::model::setpoint::Centi;
use crate::model::status::StatusEvent;

/// Tracks whether the thermostat screen is lit.
///
/// A plus/minus press on a dark screen only wakes it on the device, so it
/// must not move the setpoint here either.
#[derive(Default)]
pub struct ScreenState {
    awake: AtomicBool,
}

impl ScreenState {
    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.awake.load(Ordering::Relaxed)
    }

    /// Feed a status event. Returns the setpoint adjustment to apply, if any.
    pub fn on_event(&self, event: &StatusEvent, step: Centi) -> Option<i32> {
        let step = i32::from(step);

        match event {
            StatusEvent::ScreenWake => {
                self.awake.store(true, Ordering::Relaxed);
                None
            }
            StatusEvent::ScreenSleep => {
                self.awake.store(false, Ordering::Relaxed);
                None
            }
            StatusEvent::ButtonPlus | StatusEvent::ButtonMinus => {
                if !self.awake.swap(true, Ordering::Relaxed) {
                    return None;
                }
                if *event == StatusEvent::ButtonPlus {
                    Some(step)
                } else {
                    Some(-step)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::device::screen::ScreenState;
    use crate::model::status::StatusEvent;

    #[test]
    fn first_press_wakes() {
        let screen = ScreenState::default();
        assert!(!screen.is_awake());

        assert_eq!(screen.on_event(&StatusEvent::ButtonPlus, 50), None);
        assert!(screen.is_awake());

        assert_eq!(screen.on_event(&StatusEvent::ButtonPlus, 50), Some(50));
        assert_eq!(screen.on_event(&StatusEvent::ButtonMinus, 50), Some(-50));
    }

    #[test]
    fn sleep_resets() {
        let screen = ScreenState::default();

        screen.on_event(&StatusEvent::ScreenWake, 50);
        assert_eq!(screen.on_event(&StatusEvent::ButtonMinus, 50), Some(-50));

        screen.on_event(&StatusEvent::ScreenSleep, 50);
        assert_eq!(screen.on_event(&StatusEvent::ButtonMinus, 50), None);
    }

    #[test]
    fn center_and_unknown() {
        let screen = ScreenState::default();
        screen.on_event(&StatusEvent::ScreenWake, 50);

        assert_eq!(screen.on_event(&StatusEvent::ButtonCenter, 50), None);
        assert_eq!(
            screen.on_event(&StatusEvent::UnknownUi("Foo".into()), 50),
            None
        );
        assert!(screen.is_awake());
    }
}
