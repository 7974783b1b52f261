use packed_struct::PrimitiveEnum;

use crate::attr::{ZclCommand, ZclDefaultResp, ZclReadAttr, ZclReadAttrResp, ZclReportAttr};
use crate::error::ZclResult;
use crate::frame::ZclFrame;

pub fn describe(frame: &ZclFrame, data: &[u8]) -> ZclResult<Option<String>> {
    let cmd = ZclCommand::from_primitive(frame.cmd);
    let desc = match cmd {
        Some(ZclCommand::ReadAttrib) => {
            let req = ZclReadAttr::parse(data)?;
            Some(format!("Attr rd  -> {:04x?}", req.attr))
        }
        Some(ZclCommand::ReadAttribResp) => {
            let req = ZclReadAttrResp::parse(data)?;
            Some(format!("Attr rd <-  {:?}", req.attr))
        }
        Some(ZclCommand::ReportAttrib) => {
            let req = ZclReportAttr::parse(data)?;
            Some(format!("Attr rp <-  {:?}", req.attr))
        }
        Some(ZclCommand::DefaultResp) => {
            let req = ZclDefaultResp::parse(data)?;
            Some(format!("Default <-  cmd:{:02x} status:{:02x}", req.cmd, req.stat))
        }
        _ => None,
    };

    Ok(desc)
}
