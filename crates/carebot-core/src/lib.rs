pub mod config;
pub mod error;
pub mod types;

pub use config::CarebotConfig;
pub use error::{CarebotError, Result};
pub use types::*;
