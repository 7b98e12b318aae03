// edgemax-api: Async Rust client for the EdgeMAX stats websocket

pub mod client;
pub mod codec;
pub mod error;
pub mod stat;
pub mod stream;
pub mod transport;

pub use client::{DEFAULT_SESSION_COOKIE, EdgeMaxClient};
pub use codec::{ConnectRequest, Topic, decode_frame, encode_frame};
pub use error::Error;
pub use stat::{
    ByteCounters, DPI_TOPIC, DpiStat, INTERFACES_TOPIC, InterfaceStat, InterfacesStat, SYSTEM_TOPIC,
    SystemStat, split_dpi_key,
};
pub use stream::{StatEnvelope, StatSinks, StatsHandle, StreamConfig};
pub use transport::{TlsMode, TransportConfig};
