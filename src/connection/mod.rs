//! Message-level WebSocket connections.
//!
//! This module layers message semantics over the frame socket: fragment
//! reassembly, message size accounting, automatic PONG and CLOSE replies,
//! and the close-handshake rules for sending.
//!
//! ## Close handshake
//!
//! 1. **Open** - no CLOSE frame seen in either direction
//! 2. **CloseSent** / **CloseReceived** - one side has sent CLOSE
//! 3. **Closed** - both CLOSE frames exchanged, or transport closed
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsstack::{Config, MessageSocket, Role, SendMessage};
//!
//! let stream = tokio::net::TcpStream::connect("example.com:80").await?;
//! // ... perform the HTTP upgrade ...
//! let mut socket = MessageSocket::new(stream, Role::Client, Config::default());
//!
//! socket.send_text("Hello").await?;
//! let message = socket.read_message().await?;
//! println!("Received: {:?}", message);
//! socket.send_normal_close().await?;
//! ```

mod role;
mod state;

pub use role::Role;
pub use state::{CloseHandshake, ConnectionState};

#[allow(clippy::module_inception)]
mod connection;

pub use connection::{MessageSender, MessageSocket};
