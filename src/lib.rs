pub mod error;
pub mod level;
pub mod value;
pub mod record;
pub mod formatter;
pub mod location;
pub mod env;

#[cfg(feature = "layer")]
pub mod layer;

#[cfg(feature = "layer")]
pub mod init;
