// devprof-api: Async Rust client for the platform's device profile, LwM2M and firmware APIs

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{AuthToken, Credentials};
pub use client::PlatformClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
