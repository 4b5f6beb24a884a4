mod auth;
mod client;
mod config;
mod diff;
mod error;
mod logger;
mod parse;
mod protocol;
mod registry;
mod snapshot;
mod transport;
mod types;

pub use client::{PoolPilotClient, PoolPilotClientBuilder};
pub use config::{
    AuthMode, ConnectionConfig, DEFAULT_SCAN_INTERVAL, FieldIndexMap, IndexKey, LoginMethod,
};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use parse::{parse_accueil, parse_donnees, parse_reg};
pub use registry::DeviceRegistry;
pub use snapshot::{Fallback, Field, Snapshot};
pub use types::*;
