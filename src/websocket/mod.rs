pub mod envelope;
pub mod handler;
pub mod registry;

pub use registry::{ConnectionId, ConnectionRegistry, OUTBOUND_BUFFER};
