use std::fmt::Debug;
use std::io::{Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use packed_struct::prelude::*;

use crate::error::ZclResult;

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclFrameType {
    ProfileWide = 0x00,
    ClusterSpecific = 0x01,
}

#[derive(PrimitiveEnum_u8, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ZclFrameDirection {
    ClientToServer = 0x00,
    ServerToClient = 0x01,
}

#[derive(PackedStruct, Clone, Copy, Eq, PartialEq)]
#[packed_struct(size_bytes = "1", bit_numbering = "lsb0")]
pub struct ZclFrameFlags {
    #[packed_field(bits = "0..2", ty = "enum")]
    pub frame_type: ZclFrameType,

    #[packed_field(bits = "2")]
    pub manufacturer_specific: bool,

    #[packed_field(bits = "3", ty = "enum")]
    pub direction: ZclFrameDirection,

    #[packed_field(bits = "4")]
    pub disable_default_response: bool,
}

impl Debug for ZclFrameFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ft = match self.frame_type {
            ZclFrameType::ProfileWide => "PW",
            ZclFrameType::ClusterSpecific => "CS",
        };
        let dir = match self.direction {
            ZclFrameDirection::ClientToServer => "C2S",
            ZclFrameDirection::ServerToClient => "S2C",
        };
        write!(f, "[ ")?;
        write!(f, "ft:{ft}, ")?;
        write!(f, "ms:{}, ", u8::from(self.manufacturer_specific))?;
        write!(f, "dir:{dir}, ")?;
        write!(f, "ddr:{}", u8::from(self.disable_default_response))?;
        write!(f, " ]")?;
        Ok(())
    }
}

/// ZCL frame header: frame control, optional manufacturer code, sequence
/// number and command id. The command payload follows directly after.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ZclFrame {
    pub flags: ZclFrameFlags,
    pub mfcode: Option<u16>,
    pub seqnr: u8,
    pub cmd: u8,
}

impl ZclFrame {
    #[must_use]
    pub const fn new(
        frame_type: ZclFrameType,
        direction: ZclFrameDirection,
        mfcode: Option<u16>,
        seqnr: u8,
        cmd: u8,
    ) -> Self {
        Self {
            flags: ZclFrameFlags {
                frame_type,
                manufacturer_specific: mfcode.is_some(),
                direction,
                disable_default_response: false,
            },
            mfcode,
            seqnr,
            cmd,
        }
    }

    pub fn parse(data: &mut impl Read) -> ZclResult<Self> {
        let flags = ZclFrameFlags::unpack(&[data.read_u8()?])?;

        let mfcode = if flags.manufacturer_specific {
            Some(data.read_u16::<LE>()?)
        } else {
            None
        };

        let seqnr = data.read_u8()?;
        let cmd = data.read_u8()?;

        Ok(Self {
            flags,
            mfcode,
            seqnr,
            cmd,
        })
    }

    pub fn pack(&self, wr: &mut impl Write) -> ZclResult<()> {
        wr.write_all(&self.flags.pack()?)?;
        if let Some(mfcode) = self.mfcode {
            wr.write_u16::<LE>(mfcode)?;
        }
        wr.write_u8(self.seqnr)?;
        wr.write_u8(self.cmd)?;
        Ok(())
    }

    /// Header for a profile-wide answer to this frame: same sequence number
    /// and manufacturer code, opposite direction, no default response.
    #[must_use]
    pub const fn reply(&self, cmd: u8) -> Self {
        Self {
            flags: ZclFrameFlags {
                frame_type: ZclFrameType::ProfileWide,
                manufacturer_specific: self.mfcode.is_some(),
                direction: match self.flags.direction {
                    ZclFrameDirection::ClientToServer => ZclFrameDirection::ServerToClient,
                    ZclFrameDirection::ServerToClient => ZclFrameDirection::ClientToServer,
                },
                disable_default_response: true,
            },
            mfcode: self.mfcode,
            seqnr: self.seqnr,
            cmd,
        }
    }

    #[must_use]
    pub fn cluster_specific(&self) -> bool {
        self.flags.frame_type == ZclFrameType::ClusterSpecific
    }

    #[must_use]
    pub const fn manufacturer_specific(&self) -> bool {
        self.flags.manufacturer_specific
    }

    #[must_use]
    pub const fn wants_default_response(&self) -> bool {
        !self.flags.disable_default_response
    }
}
