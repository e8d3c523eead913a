//! # wsstack - Layered WebSocket Protocol Engine
//!
//! `wsstack` implements RFC 6455 over any `tokio` byte stream, symmetrically
//! for clients and servers, as three composable layers:
//!
//! - **Frame layer** ([`FrameSocket`]): wire codec, masking, and
//!   single-frame legality checks
//! - **Message layer** ([`MessageSocket`]): fragment reassembly, automatic
//!   PONG and CLOSE replies, and the close handshake
//! - **Event layer** ([`EventSocket`]): a read loop that dispatches to
//!   registered callbacks
//!
//! The HTTP upgrade is left to the caller; [`compute_accept_key`] and
//! [`generate_key`] produce the handshake header values.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsstack::{Config, MessageSocket, Role, SendMessage};
//!
//! // After the HTTP upgrade on `stream`:
//! let mut socket = MessageSocket::new(stream, Role::Client, Config::default());
//! socket.send_text("hello").await?;
//! let reply = socket.read_message().await?;
//! ```

pub mod close;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod message;
pub mod protocol;

pub use close::{CloseCode, CloseInfo, MAX_CLOSE_REASON_LEN};
pub use codec::{FrameSocket, FrameWriter};
pub use config::{Config, Limits};
pub use connection::{ConnectionState, MessageSender, MessageSocket, Role};
pub use error::{Error, Result};
pub use event::{CallbackExecutor, EventSocket};
pub use message::{Message, MessageType, SendMessage};
pub use protocol::{Frame, OpCode, WS_GUID, compute_accept_key, generate_key};

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_public_types_are_send() {
        assert_send::<Error>();
        assert_send::<Config>();
        assert_send::<Limits>();
        assert_send::<Message>();
        assert_send::<CloseCode>();
        assert_send::<CloseInfo>();
        assert_send::<ConnectionState>();
        assert_send::<Role>();
        assert_send::<FrameSocket<DuplexStream>>();
        assert_send::<MessageSocket<DuplexStream>>();
        assert_send::<MessageSender<DuplexStream>>();
        assert_send::<EventSocket<DuplexStream>>();
    }

    #[test]
    fn test_public_types_are_sync() {
        assert_sync::<Error>();
        assert_sync::<Config>();
        assert_sync::<Limits>();
        assert_sync::<Message>();
        assert_sync::<CloseInfo>();
        assert_sync::<ConnectionState>();
        assert_sync::<Role>();
        assert_sync::<FrameWriter<DuplexStream>>();
        assert_sync::<MessageSender<DuplexStream>>();
    }

    #[tokio::test]
    async fn test_socket_sends_are_spawnable() {
        let (local, _message_peer) = tokio::io::duplex(64);
        let message_socket = MessageSocket::new(local, Role::Server, Config::default());
        let (local, _event_peer) = tokio::io::duplex(64);
        let event_socket = EventSocket::new(local, Role::Server, Config::default());

        let message_task = tokio::spawn(async move {
            message_socket.send_text("a").await?;
            message_socket.send_normal_close().await
        });
        let event_task = tokio::spawn(async move {
            event_socket.send_binary(vec![1]).await?;
            event_socket.send_close_with(4000, "done").await
        });

        message_task.await.unwrap().unwrap();
        event_task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_event_loop_is_spawnable() {
        let (local, _peer) = tokio::io::duplex(64);
        let mut socket = EventSocket::new(local, Role::Server, Config::default());
        let sender = socket.sender();

        let task = tokio::spawn(async move { socket.start().await });
        sender.close().await;
        task.await.unwrap();
    }
}
