//! A Tokio implementation of the ENet reliable-UDP transport, paired with the
//! binary game packet codec spoken by clients on top of it.
//!
//! - [`protocol`] holds the wire codec: datagram header, commands, primitives.
//! - [`session`] holds per-peer state: sequencing, acknowledgement,
//!   retransmission and fragment reassembly.
//! - [`transport`] holds the sans-IO [`transport::Host`] engine and the
//!   socket-owning [`transport::EnetListener`].
//! - [`game`] holds the application layer: game packets, variant lists,
//!   payload masking and message framing.

pub mod config;
pub mod error;
pub mod game;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{EnetError, Resource};
pub use protocol::state::{DisconnectReason, Event, PeerState};
pub use protocol::types::PeerId;
