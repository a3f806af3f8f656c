// tailrelay-api: Async Rust client for the tailrelay web UI backend

pub mod client;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{
    CertificateUpload, LevelResponse, LogEntry, LogLevel, LogSnapshot, Proxy, ProxyForm, Relay,
    RelayStatus, StreamMessage, TailscaleStatus,
};
pub use stream::{EventStream, SseDecoder};
pub use transport::{TlsMode, TransportConfig};
