pub mod codec;
pub mod connection;
pub mod ice;
pub mod types;

pub use codec::{decode, encode, Envelope};
pub use connection::{Connector, GatherPolicy, PeerConnection, PeerEvents, RtcConnector};
pub use ice::{IceServerKind, ServerConfig};
pub use types::{ConnectionState, LocalCandidate, SdpType, SessionDescription, TrackInfo};
