pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod model;
pub mod store;
