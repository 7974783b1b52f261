use zcl::attr::{ZclAttr, ZclAttrValue};
use zcl::cluster::basic;

use crate::config::IdentityConfig;

const ZCL_VERSION: u8 = 3;
const APPLICATION_VERSION: u8 = 1;
const STACK_VERSION: u8 = 2;
const HW_VERSION: u8 = 1;

/// Mains powered, single phase
const POWER_SOURCE_MAINS: u8 = 0x01;

/// Basic cluster server. The thermostat reads these to decide whether its
/// binding target is alive.
pub struct IdentityResponder {
    identity: IdentityConfig,
}

impl IdentityResponder {
    #[must_use]
    pub const fn new(identity: IdentityConfig) -> Self {
        Self { identity }
    }

    #[must_use]
    pub fn read_attribute(&self, id: u16) -> ZclAttrValue {
        match id {
            basic::ZCL_VERSION => ZclAttrValue::U8(ZCL_VERSION),
            basic::APPLICATION_VERSION => ZclAttrValue::U8(APPLICATION_VERSION),
            basic::STACK_VERSION => ZclAttrValue::U8(STACK_VERSION),
            basic::HW_VERSION => ZclAttrValue::U8(HW_VERSION),
            basic::MANUFACTURER_NAME => ZclAttrValue::String(self.identity.manufacturer_name.clone()),
            basic::MODEL_IDENTIFIER => ZclAttrValue::String(self.identity.model_identifier.clone()),
            basic::DATE_CODE => ZclAttrValue::String(self.identity.date_code.clone()),
            basic::POWER_SOURCE => ZclAttrValue::E8(POWER_SOURCE_MAINS),
            basic::LOCATION_DESCRIPTION => ZclAttrValue::String(String::new()),
            basic::PHYSICAL_ENVIRONMENT => ZclAttrValue::E8(0),
            basic::DEVICE_ENABLED => ZclAttrValue::Bool(true),
            basic::ALARM_MASK | basic::DISABLE_LOCAL_CONFIG => ZclAttrValue::B8(0),
            _ => ZclAttrValue::Unsupported,
        }
    }

    #[must_use]
    pub fn read(&self, ids: &[u16]) -> Vec<ZclAttr> {
        ids.iter()
            .map(|id| ZclAttr::new(*id, self.read_attribute(*id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use zcl::attr::{ZclAttr, ZclAttrValue, ZclReadAttrResp};
    use zcl::cluster::basic;

    use crate::config::IdentityConfig;
    use crate::device::identity::IdentityResponder;

    #[test]
    fn identity_strings() {
        let resp = IdentityResponder::new(IdentityConfig {
            manufacturer_name: "Homey".into(),
            model_identifier: "Hub".into(),
            date_code: "20240101".into(),
        });

        assert_eq!(
            resp.read(&[basic::MANUFACTURER_NAME, basic::MODEL_IDENTIFIER]),
            vec![
                ZclAttr::new(basic::MANUFACTURER_NAME, ZclAttrValue::String("Homey".into())),
                ZclAttr::new(basic::MODEL_IDENTIFIER, ZclAttrValue::String("Hub".into())),
            ]
        );
    }

    #[test]
    fn liveness_probe() {
        let resp = IdentityResponder::new(IdentityConfig::default());

        let attrs = ZclReadAttrResp {
            attr: resp.read(&[basic::ZCL_VERSION, basic::POWER_SOURCE, basic::DEVICE_ENABLED, 0x4000]),
        };

        let mut out = vec![];
        attrs.pack(&mut out).unwrap();
        assert_eq!(
            "0000002003 0700003001 1200001001 004086".replace(' ', ""),
            hex::encode(out)
        );
    }
}
