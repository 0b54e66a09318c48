pub mod config;
pub mod error;
pub mod logger;
pub mod peer;
pub mod session;
pub mod signaling;
pub mod transport;
pub mod utils;

pub use error::{Result, SignalError};
pub use signaling::SignalingClient;
