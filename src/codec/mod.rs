//! Frame-level WebSocket I/O over async streams.
//!
//! [`FrameSocket`] reads one validated frame at a time; [`FrameWriter`]
//! serializes writes and aborts the transport.

mod framed;

pub use framed::{FrameSocket, FrameWriter};
