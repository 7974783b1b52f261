use crate::model::setpoint::{self, Centi};

/// Fallback for local setpoint writes that carry no usable number
pub const FALLBACK_CELSIUS: f64 = 20.0;

pub trait Clamp {
    /// Degrees Celsius to an in-range setpoint. Never fails.
    fn celsius_to_centi_clamped(self) -> Centi;

    /// Percentage to `0..=100`, rounded.
    fn percent_clamped(self) -> u8;
}

impl Clamp for f64 {
    #[allow(clippy::cast_possible_truncation)]
    fn celsius_to_centi_clamped(self) -> Centi {
        let celsius = if self.is_finite() {
            self
        } else {
            FALLBACK_CELSIUS
        };

        let lo = setpoint::to_celsius(setpoint::MIN);
        let hi = setpoint::to_celsius(setpoint::MAX);

        (celsius.clamp(lo, hi) * 100.0).round() as Centi
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn percent_clamped(self) -> u8 {
        if self.is_nan() {
            return 0;
        }
        self.clamp(0.0, 100.0).round() as u8
    }
}
