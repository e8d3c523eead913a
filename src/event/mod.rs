//! Callback-driven WebSocket connections.
//!
//! [`EventSocket`] runs the read loop of a [`MessageSocket`] and turns
//! every message, failure and close into a handler call. Handlers run
//! inline by default, or through a [`CallbackExecutor`].
//!
//! [`MessageSocket`]: crate::connection::MessageSocket

pub mod executor;
mod handlers;
mod socket;

pub use executor::{CallbackExecutor, Task};
pub use handlers::Handler;
pub use socket::EventSocket;
