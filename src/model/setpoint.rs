//! Setpoint representation: integer hundredths of a degree Celsius.

/// Centi-degrees Celsius (2050 = 20.50 °C)
pub type Centi = i16;

pub const MIN: Centi = 400;
pub const MAX: Centi = 3000;
pub const DEFAULT: Centi = 2000;
pub const STEP: Centi = 50;

#[must_use]
pub const fn in_range(value: i32) -> bool {
    value >= MIN as i32 && value <= MAX as i32
}

/// Narrow an inbound value, if it is an accepted setpoint.
#[must_use]
pub fn validate(value: i32) -> Option<Centi> {
    if in_range(value) {
        Centi::try_from(value).ok()
    } else {
        None
    }
}

#[must_use]
pub fn to_celsius(value: Centi) -> f64 {
    f64::from(value) / 100.0
}

/// Move `current` by `delta`, saturating at the setpoint limits.
#[must_use]
pub fn step(current: Centi, delta: i32) -> Centi {
    let target = (i32::from(current) + delta).clamp(i32::from(MIN), i32::from(MAX));
    Centi::try_from(target).unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use zcl::cluster::measurement::NOT_AVAILABLE;

    use crate::model::setpoint::{self, MAX, MIN};

    #[test]
    fn range_is_inclusive() {
        assert!(setpoint::in_range(400));
        assert!(setpoint::in_range(3000));
        assert!(!setpoint::in_range(399));
        assert!(!setpoint::in_range(3001));
        assert!(!setpoint::in_range(i32::from(NOT_AVAILABLE)));
    }

    #[test]
    fn validate_narrows() {
        assert_eq!(setpoint::validate(1800), Some(1800));
        assert_eq!(setpoint::validate(65535), None);
    }

    #[test]
    fn step_saturates() {
        assert_eq!(setpoint::step(2000, 50), 2050);
        assert_eq!(setpoint::step(2980, 50), MAX);
        assert_eq!(setpoint::step(420, -50), MIN);
    }

    #[test]
    fn celsius() {
        assert!((setpoint::to_celsius(1800) - 18.0).abs() < f64::EPSILON);
        assert!((setpoint::to_celsius(2230) - 22.3).abs() < 1e-9);
    }
}
