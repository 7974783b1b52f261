use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZclError {
    /* mapped errors */
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    PackedStructError(#[from] packed_struct::PackingError),

    #[error("Unsupported zcl data type {0:02x}")]
    UnsupportedDataType(u8),

    #[error("Read attribute request has odd length {0}")]
    OddAttributeList(usize),

    #[error("String of {0} bytes does not fit in a zcl string")]
    StringTooLong(usize),

    #[error("Payload too short: expected {expected} bytes, found {found}")]
    PayloadTooShort { expected: usize, found: usize },
}

pub type ZclResult<T> = Result<T, ZclError>;
