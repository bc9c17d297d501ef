//! Build status push channel
//!
//! The channel only carries server events; it never decides build state.
//! Consumers feed [`ChannelEvent::Update`] into the build controller.

pub mod backoff;
pub mod channel;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use channel::{parse_status, ChannelEvent, StatusChannel};
pub use transport::{transport_for, SocketTransport, SseDecoder, SseTransport, StatusStream, StatusTransport};
