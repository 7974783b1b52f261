use std::time::Duration;

use thiserror::Error;

use zcl::error::ZclError;

#[derive(Error, Debug)]
pub enum BindError {
    /* mapped errors */
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    SerdeYaml(#[from] serde_yml::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),

    #[error(transparent)]
    SetLoggerError(#[from] log::SetLoggerError),

    #[error(transparent)]
    ZclError(#[from] ZclError),

    /* setpoint errors */
    #[error("Setpoint {0} is outside the accepted range")]
    SetpointOutOfRange(i32),

    /* transport errors */
    #[error("No answer from device within {0:?}")]
    ReadTimeout(Duration),

    #[error("Transport channel closed")]
    TransportClosed,

    #[error("Attribute {1:04x} missing from read response of cluster {0:04x}")]
    MissingAttribute(u16, u16),

    /* thermobind errors */
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type BindResult<T> = Result<T, BindError>;
