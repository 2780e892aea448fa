//! Wire-level transports: length-prefixed framing shared by both peers,
//! the Executor Link (TCP server, Executor dials in), and the Bridge Link
//! (WebSocket client, reconnects with backoff).

pub mod bridge;
pub mod executor;
pub mod framed;

pub use bridge::{spawn as spawn_bridge, BridgeHandle, BridgeLinkConfig};
pub use executor::{spawn as spawn_executor, ExecutorHandle};
pub use framed::{read_frame, write_frame, FramedError, MAX_FRAME_LEN};
