//! Decoder for the Wiser device-info text channel.
//!
//! The thermostat reports its user interface activity and periodic
//! environment snapshots as comma separated ASCII lines:
//!
//! ```text
//! UI,ButtonPressPlusDown
//! ENV,2000,2150,5000      (setpoint, temperature, humidity; centi-units)
//! ALG,...                 (ignored)
//! ADC,...                 (ignored)
//! ```

use zcl::attr::ZclAttrValue;
use zcl::cluster::measurement::NOT_AVAILABLE;

use crate::model::setpoint::{self, Centi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    ScreenWake,
    ScreenSleep,
    ButtonPlus,
    ButtonMinus,
    ButtonCenter,
    UnknownUi(String),
    Env {
        setpoint: Centi,
        temperature: i32,
        humidity: i32,
    },
    Ignored,
    Invalid,
}

const HUMIDITY_MAX: i32 = 10000;

/// Leading integer of a field: optional sign, then digits. Anything after
/// the digits is ignored; a field without digits does not parse.
fn parse_field(field: Option<&str>) -> Option<i32> {
    let field = field?.trim_start();
    let unsigned = field.strip_prefix(['+', '-']).unwrap_or(field);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let end = field.len() - unsigned.len() + digits;
    field.get(..end)?.parse().ok()
}

fn parse_env<'a>(mut fields: impl Iterator<Item = &'a str>) -> StatusEvent {
    let (Some(sp), Some(temp), Some(hum)) = (
        parse_field(fields.next()),
        parse_field(fields.next()),
        parse_field(fields.next()),
    ) else {
        return StatusEvent::Invalid;
    };

    let Some(setpoint) = setpoint::validate(sp) else {
        return StatusEvent::Invalid;
    };

    if temp == i32::from(NOT_AVAILABLE) || !(0..=HUMIDITY_MAX).contains(&hum) {
        return StatusEvent::Invalid;
    }

    StatusEvent::Env {
        setpoint,
        temperature: temp,
        humidity: hum,
    }
}

fn parse_ui(action: Option<&str>) -> StatusEvent {
    match action.map(str::trim) {
        Some("ScreenWake") => StatusEvent::ScreenWake,
        Some("ScreenSleep") => StatusEvent::ScreenSleep,
        Some("ButtonPressPlusDown") => StatusEvent::ButtonPlus,
        Some("ButtonPressMinusDown") => StatusEvent::ButtonMinus,
        Some("ButtonPressCenterDown") => StatusEvent::ButtonCenter,
        Some(other) => StatusEvent::UnknownUi(other.to_string()),
        None => StatusEvent::UnknownUi(String::new()),
    }
}

impl StatusEvent {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        if line.is_empty() {
            return Self::Invalid;
        }

        let mut fields = line.split(',');

        match fields.next() {
            Some("ENV") => parse_env(fields),
            Some("UI") => parse_ui(fields.next()),
            _ => Self::Ignored,
        }
    }

    /// Decode a reported device-info attribute. Anything but a string is invalid.
    #[must_use]
    pub fn from_attr(value: &ZclAttrValue) -> Self {
        match value {
            ZclAttrValue::String(line) => Self::parse(line),
            _ => Self::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use zcl::attr::ZclAttrValue;

    use crate::model::status::StatusEvent;

    #[test]
    fn env_valid() {
        assert_eq!(
            StatusEvent::parse("ENV,2000,2150,5000"),
            StatusEvent::Env {
                setpoint: 2000,
                temperature: 2150,
                humidity: 5000
            }
        );
    }

    #[test]
    fn env_sentinel_setpoint() {
        assert_eq!(StatusEvent::parse("ENV,-32768,2000,5000"), StatusEvent::Invalid);
    }

    #[test]
    fn env_too_short() {
        assert_eq!(StatusEvent::parse("ENV,2000"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,2150"), StatusEvent::Invalid);
    }

    #[test]
    fn env_field_limits() {
        assert_eq!(StatusEvent::parse("ENV,3001,2150,5000"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,-32768,5000"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,2150,10001"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,2150,-1"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,20.5,2150,5000"), StatusEvent::Invalid);
    }

    #[test]
    fn env_leading_integer() {
        assert_eq!(
            StatusEvent::parse("ENV,2050.5,2150,5000"),
            StatusEvent::Env {
                setpoint: 2050,
                temperature: 2150,
                humidity: 5000
            }
        );
        assert_eq!(
            StatusEvent::parse("ENV, 2100,-215x,+50"),
            StatusEvent::Env {
                setpoint: 2100,
                temperature: -215,
                humidity: 50
            }
        );
    }

    #[test]
    fn env_without_digits() {
        assert_eq!(StatusEvent::parse("ENV,abc,2150,5000"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,,5000"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,2000,2150,-"), StatusEvent::Invalid);
        assert_eq!(StatusEvent::parse("ENV,.5,2150,5000"), StatusEvent::Invalid);
    }

    #[test]
    fn env_temperature_outside_physical_range() {
        assert_eq!(
            StatusEvent::parse("ENV,400,-9000,0"),
            StatusEvent::Env {
                setpoint: 400,
                temperature: -9000,
                humidity: 0
            }
        );
    }

    #[test]
    fn ui_events() {
        assert_eq!(StatusEvent::parse("UI,ScreenWake"), StatusEvent::ScreenWake);
        assert_eq!(StatusEvent::parse("UI,ScreenSleep"), StatusEvent::ScreenSleep);
        assert_eq!(
            StatusEvent::parse("UI,ButtonPressPlusDown"),
            StatusEvent::ButtonPlus
        );
        assert_eq!(
            StatusEvent::parse("UI,ButtonPressMinusDown"),
            StatusEvent::ButtonMinus
        );
        assert_eq!(
            StatusEvent::parse("UI,ButtonPressCenterDown"),
            StatusEvent::ButtonCenter
        );
        assert_eq!(
            StatusEvent::parse("UI,ButtonPressPlusUp"),
            StatusEvent::UnknownUi("ButtonPressPlusUp".into())
        );
    }

    #[test]
    fn other_categories() {
        assert_eq!(StatusEvent::parse("XYZ,foo"), StatusEvent::Ignored);
        assert_eq!(StatusEvent::parse("ALG,1,2,3"), StatusEvent::Ignored);
        assert_eq!(StatusEvent::parse(""), StatusEvent::Invalid);
    }

    #[test]
    fn attribute_values() {
        assert_eq!(
            StatusEvent::from_attr(&ZclAttrValue::String("UI,ScreenWake".into())),
            StatusEvent::ScreenWake
        );
        assert_eq!(
            StatusEvent::from_attr(&ZclAttrValue::U16(2000)),
            StatusEvent::Invalid
        );
    }
}
