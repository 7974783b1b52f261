use std::fmt::Debug;
use std::io::{Cursor, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use packed_struct::prelude::*;

use crate::error::{ZclError, ZclResult};

pub const ZCL_STATUS_SUCCESS: u8 = 0x00;
pub const ZCL_STATUS_MALFORMED_COMMAND: u8 = 0x80;
pub const ZCL_STATUS_UNSUPPORTED_ATTRIBUTE: u8 = 0x86;

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclCommand {
    ReadAttrib = 0x00,
    ReadAttribResp = 0x01,
    WriteAttrib = 0x02,
    WriteAttribUndiv = 0x03,
    WriteAttribResp = 0x04,
    WriteAttribNoResp = 0x05,
    ConfigReport = 0x06,
    ConfigReportResp = 0x07,
    ReadReportCfg = 0x08,
    ReadReportCfgResp = 0x09,
    ReportAttrib = 0x0a,
    DefaultResp = 0x0b,
    DiscAttrib = 0x0c,
    DiscAttribResp = 0x0d,
}

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclDataType {
    /** Null data type */
    Null = 0x00,

    /** 8-bit value data type */
    Zcl8bit = 0x08,

    /** 16-bit value data type */
    Zcl16bit = 0x09,

    /** 32-bit value data type */
    Zcl32bit = 0x0b,

    /** Boolean data type */
    ZclBool = 0x10,

    /** 8-bit bitmap data type */
    Zcl8bitmap = 0x18,

    /** 16-bit bitmap data type */
    Zcl16bitmap = 0x19,

    /** 32-bit bitmap data type */
    Zcl32bitmap = 0x1b,

    /** Unsigned 8-bit value data type */
    ZclU8 = 0x20,

    /** Unsigned 16-bit value data type */
    ZclU16 = 0x21,

    /** Unsigned 32-bit value data type */
    ZclU32 = 0x23,

    /** Signed 8-bit value data type */
    ZclI8 = 0x28,

    /** Signed 16-bit value data type */
    ZclI16 = 0x29,

    /** Signed 32-bit value data type */
    ZclI32 = 0x2b,

    /** 8-bit enumeration data type */
    ZclE8 = 0x30,

    /** Byte array data type */
    ZclBytearray = 0x41,

    /** Charactery string (array) data type */
    ZclCharstring = 0x42,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZclReadAttr {
    pub attr: Vec<u16>,
}

impl ZclReadAttr {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        if data.len() % 2 != 0 {
            return Err(ZclError::OddAttributeList(data.len()));
        }

        let attr = data
            .chunks(2)
            .map(|v| u16::from_le_bytes([v[0], v[1]]))
            .collect();

        Ok(Self { attr })
    }

    pub fn pack(&self, wr: &mut impl Write) -> ZclResult<()> {
        for key in &self.attr {
            wr.write_u16::<LE>(*key)?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum ZclAttrValue {
    Null,
    X8(i8),
    X16(i16),
    X32(i32),
    Bool(bool),
    B8(u8),
    B16(u16),
    B32(u32),
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    E8(u8),
    Bytes(Vec<u8>),
    String(String),
    /// Read record that carried a non-success status
    Unsupported,
}

impl Debug for ZclAttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::X8(val) => write!(f, "x8:{val}"),
            Self::X16(val) => write!(f, "x16:{val}"),
            Self::X32(val) => write!(f, "x32:{val}"),
            Self::Bool(val) => write!(f, "bool:{val}"),
            Self::B8(val)  => write!(f, "b8:{val:02X}"),
            Self::B16(val) => write!(f, "b16:{val:04X}"),
            Self::B32(val) => write!(f, "b32:{val:08X}"),
            Self::U8(val) => write!(f, "u8:{val}"),
            Self::U16(val) => write!(f, "u16:{val}"),
            Self::U32(val) => write!(f, "u32:{val}"),
            Self::I8(val) => write!(f, "i8:{val}"),
            Self::I16(val) => write!(f, "i16:{val}"),
            Self::I32(val) => write!(f, "i32:{val}"),
            Self::E8(val) => write!(f, "e8:{val:02X}"),
            Self::Bytes(val) => write!(f, "hex:{}", hex::encode(val)),
            Self::String(val) => write!(f, "str:{}", &val),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

impl ZclAttrValue {
    /// Wire data type of this value. `Unsupported` has none.
    #[must_use]
    pub const fn data_type(&self) -> Option<ZclDataType> {
        let dtype = match self {
            Self::Null => ZclDataType::Null,
            Self::X8(_) => ZclDataType::Zcl8bit,
            Self::X16(_) => ZclDataType::Zcl16bit,
            Self::X32(_) => ZclDataType::Zcl32bit,
            Self::Bool(_) => ZclDataType::ZclBool,
            Self::B8(_) => ZclDataType::Zcl8bitmap,
            Self::B16(_) => ZclDataType::Zcl16bitmap,
            Self::B32(_) => ZclDataType::Zcl32bitmap,
            Self::U8(_) => ZclDataType::ZclU8,
            Self::U16(_) => ZclDataType::ZclU16,
            Self::U32(_) => ZclDataType::ZclU32,
            Self::I8(_) => ZclDataType::ZclI8,
            Self::I16(_) => ZclDataType::ZclI16,
            Self::I32(_) => ZclDataType::ZclI32,
            Self::E8(_) => ZclDataType::ZclE8,
            Self::Bytes(_) => ZclDataType::ZclBytearray,
            Self::String(_) => ZclDataType::ZclCharstring,
            Self::Unsupported => return None,
        };
        Some(dtype)
    }

    /// Integer view of any numeric value, for callers that only care about
    /// the number (e.g. measurement reports sent with a looser type).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::X8(val) | Self::I8(val) => Some(i64::from(*val)),
            Self::X16(val) | Self::I16(val) => Some(i64::from(*val)),
            Self::X32(val) | Self::I32(val) => Some(i64::from(*val)),
            Self::B8(val) | Self::U8(val) | Self::E8(val) => Some(i64::from(*val)),
            Self::B16(val) | Self::U16(val) => Some(i64::from(*val)),
            Self::B32(val) | Self::U32(val) => Some(i64::from(*val)),
            _ => None,
        }
    }

    fn read_typed(rdr: &mut impl Read, dtype: ZclDataType) -> ZclResult<Self> {
        let value = match dtype {
            ZclDataType::Null => Self::Null,
            ZclDataType::Zcl8bit => Self::X8(rdr.read_i8()?),
            ZclDataType::Zcl16bit => Self::X16(rdr.read_i16::<LE>()?),
            ZclDataType::Zcl32bit => Self::X32(rdr.read_i32::<LE>()?),
            ZclDataType::ZclBool => Self::Bool(rdr.read_u8()? != 0),
            ZclDataType::Zcl8bitmap => Self::B8(rdr.read_u8()?),
            ZclDataType::Zcl16bitmap => Self::B16(rdr.read_u16::<LE>()?),
            ZclDataType::Zcl32bitmap => Self::B32(rdr.read_u32::<LE>()?),
            ZclDataType::ZclU8 => Self::U8(rdr.read_u8()?),
            ZclDataType::ZclU16 => Self::U16(rdr.read_u16::<LE>()?),
            ZclDataType::ZclU32 => Self::U32(rdr.read_u32::<LE>()?),
            ZclDataType::ZclI8 => Self::I8(rdr.read_i8()?),
            ZclDataType::ZclI16 => Self::I16(rdr.read_i16::<LE>()?),
            ZclDataType::ZclI32 => Self::I32(rdr.read_i32::<LE>()?),
            ZclDataType::ZclE8 => Self::E8(rdr.read_u8()?),
            ZclDataType::ZclBytearray => {
                let len = rdr.read_u8()?;
                let mut buf = vec![0; len as usize];
                rdr.read_exact(&mut buf)?;
                Self::Bytes(buf)
            }
            ZclDataType::ZclCharstring => {
                let len = rdr.read_u8()?;
                let mut buf = vec![0; len as usize];
                rdr.read_exact(&mut buf)?;
                Self::String(String::from_utf8(buf)?)
            }
        };

        Ok(value)
    }

    fn write_short_array(wr: &mut impl Write, data: &[u8]) -> ZclResult<()> {
        let len = u8::try_from(data.len()).map_err(|_| ZclError::StringTooLong(data.len()))?;
        wr.write_u8(len)?;
        wr.write_all(data)?;
        Ok(())
    }

    /// Write data type byte followed by the encoded value.
    pub fn write_typed(&self, wr: &mut impl Write) -> ZclResult<()> {
        let Some(dtype) = self.data_type() else {
            return Err(ZclError::PackedStructError(PackingError::InvalidValue));
        };
        wr.write_u8(dtype.to_primitive())?;

        match self {
            Self::Null | Self::Unsupported => {}
            Self::X8(val) | Self::I8(val) => wr.write_i8(*val)?,
            Self::X16(val) | Self::I16(val) => wr.write_i16::<LE>(*val)?,
            Self::X32(val) | Self::I32(val) => wr.write_i32::<LE>(*val)?,
            Self::Bool(val) => wr.write_u8(u8::from(*val))?,
            Self::B8(val) | Self::U8(val) | Self::E8(val) => wr.write_u8(*val)?,
            Self::B16(val) | Self::U16(val) => wr.write_u16::<LE>(*val)?,
            Self::B32(val) | Self::U32(val) => wr.write_u32::<LE>(*val)?,
            Self::Bytes(val) => Self::write_short_array(wr, val)?,
            Self::String(val) => Self::write_short_array(wr, val.as_bytes())?,
        }

        Ok(())
    }
}

impl Debug for ZclAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:?}", self.key, self.value)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ZclAttr {
    pub key: u16,
    pub value: ZclAttrValue,
}

impl ZclAttr {
    #[must_use]
    pub const fn new(key: u16, value: ZclAttrValue) -> Self {
        Self { key, value }
    }

    #[must_use]
    pub const fn unsupported(key: u16) -> Self {
        Self::new(key, ZclAttrValue::Unsupported)
    }

    fn from_reader(rdr: &mut impl Read, check_status: bool) -> ZclResult<Self> {
        let key = rdr.read_u16::<LE>()?;

        if check_status {
            let status = rdr.read_u8()?;
            if status != ZCL_STATUS_SUCCESS {
                return Ok(Self::unsupported(key));
            }
        }

        let raw = rdr.read_u8()?;
        let dtype = ZclDataType::from_primitive(raw).ok_or(ZclError::UnsupportedDataType(raw))?;

        let value = ZclAttrValue::read_typed(rdr, dtype)?;

        Ok(Self { key, value })
    }

    pub fn readattr_from_reader(rdr: &mut impl Read) -> ZclResult<Self> {
        Self::from_reader(rdr, true)
    }

    pub fn report_from_reader(rdr: &mut impl Read) -> ZclResult<Self> {
        Self::from_reader(rdr, false)
    }

    /// Encode as a read attributes response record
    pub fn write_read_record(&self, wr: &mut impl Write) -> ZclResult<()> {
        wr.write_u16::<LE>(self.key)?;
        if self.value == ZclAttrValue::Unsupported {
            wr.write_u8(ZCL_STATUS_UNSUPPORTED_ATTRIBUTE)?;
            return Ok(());
        }
        wr.write_u8(ZCL_STATUS_SUCCESS)?;
        self.value.write_typed(wr)
    }
}

fn parse_records(
    data: &[u8],
    func: impl Fn(&mut Cursor<&[u8]>) -> ZclResult<ZclAttr>,
) -> ZclResult<Vec<ZclAttr>> {
    let mut attr = vec![];

    let mut cur = Cursor::new(data);
    while (cur.position() as usize) < data.len() {
        attr.push(func(&mut cur)?);
    }

    Ok(attr)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZclReadAttrResp {
    pub attr: Vec<ZclAttr>,
}

impl ZclReadAttrResp {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        let attr = parse_records(data, |cur| ZclAttr::readattr_from_reader(cur))?;
        Ok(Self { attr })
    }

    pub fn pack(&self, wr: &mut impl Write) -> ZclResult<()> {
        for attr in &self.attr {
            attr.write_read_record(wr)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZclReportAttr {
    pub attr: Vec<ZclAttr>,
}

impl ZclReportAttr {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        let attr = parse_records(data, |cur| ZclAttr::report_from_reader(cur))?;
        Ok(Self { attr })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZclDefaultResp {
    pub cmd: u8,
    pub stat: u8,
}

impl ZclDefaultResp {
    pub fn parse(data: &[u8]) -> ZclResult<Self> {
        match data {
            [cmd, stat, ..] => Ok(Self {
                cmd: *cmd,
                stat: *stat,
            }),
            _ => Err(ZclError::PayloadTooShort {
                expected: 2,
                found: data.len(),
            }),
        }
    }

    pub fn pack(&self, wr: &mut impl Write) -> ZclResult<()> {
        wr.write_u8(self.cmd)?;
        wr.write_u8(self.stat)?;
        Ok(())
    }
}
