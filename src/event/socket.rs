use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::close::{CloseCode, CloseInfo, MAX_CLOSE_REASON_LEN};
use crate::config::Config;
use crate::connection::{ConnectionState, MessageSender, MessageSocket, Role};
use crate::error::{Error, Result};
use crate::event::executor::CallbackExecutor;
use crate::event::handlers::{Handlers, dispatch};
use crate::message::{Message, MessageType, SendMessage};

/// Callback-driven WebSocket endpoint.
///
/// Register handlers with the `on_*` methods, then drive the connection with
/// [`start`](Self::start), which reads messages until the connection ends.
/// Handlers are plain closures; to reply from inside one, capture a
/// [`MessageSender`] from [`sender`](Self::sender) and spawn the send.
///
/// Every connection ends with exactly one `on_close` call: the peer's close
/// info for a regular CLOSE, or a locally derived one after a failure. A
/// failure is first reported through `on_error`.
///
/// ## Example
///
/// ```rust,ignore
/// use wsstack::{Config, EventSocket, Role, SendMessage};
///
/// let mut socket = EventSocket::new(stream, Role::Server, Config::default());
/// let sender = socket.sender();
/// socket
///     .on_text(move |text| {
///         let sender = sender.clone();
///         tokio::spawn(async move { sender.send_text(text).await });
///     })
///     .on_close(|info| println!("closed: {info}"));
/// socket.start().await;
/// ```
pub struct EventSocket<T> {
    socket: MessageSocket<T>,
    handlers: Handlers,
    executor: Option<Arc<dyn CallbackExecutor>>,
    running: bool,
    finished: bool,
}

impl<T> std::fmt::Debug for EventSocket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSocket")
            .field("socket", &self.socket)
            .field("handlers", &self.handlers)
            .field("executor", &self.executor.is_some())
            .field("running", &self.running)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T> EventSocket<T>
where
    T: AsyncRead + AsyncWrite + Send,
{
    /// Create an event socket over an upgraded stream.
    #[must_use]
    pub fn new(io: T, role: Role, config: Config) -> Self {
        Self::from_message_socket(MessageSocket::new(io, role, config))
    }

    /// Drive an existing message socket with callbacks.
    #[must_use]
    pub fn from_message_socket(socket: MessageSocket<T>) -> Self {
        Self {
            socket,
            handlers: Handlers::default(),
            executor: None,
            running: false,
            finished: false,
        }
    }

    /// Run every handler through `executor` instead of on the reader task.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Handle TEXT messages.
    pub fn on_text(&mut self, handler: impl Fn(String) + Send + Sync + 'static) -> &mut Self {
        self.handlers.text = Some(Arc::new(handler));
        self
    }

    /// Handle BINARY messages.
    pub fn on_binary(&mut self, handler: impl Fn(Vec<u8>) + Send + Sync + 'static) -> &mut Self {
        self.handlers.binary = Some(Arc::new(handler));
        self
    }

    /// Observe PING messages. The PONG reply is sent automatically.
    pub fn on_ping(&mut self, handler: impl Fn(Vec<u8>) + Send + Sync + 'static) -> &mut Self {
        self.handlers.ping = Some(Arc::new(handler));
        self
    }

    pub fn on_pong(&mut self, handler: impl Fn(Vec<u8>) + Send + Sync + 'static) -> &mut Self {
        self.handlers.pong = Some(Arc::new(handler));
        self
    }

    /// Called once when the connection ends.
    pub fn on_close(&mut self, handler: impl Fn(CloseInfo) + Send + Sync + 'static) -> &mut Self {
        self.handlers.close = Some(Arc::new(handler));
        self
    }

    /// Called with the failure that ended the read loop, before `on_close`.
    pub fn on_error(&mut self, handler: impl Fn(Error) + Send + Sync + 'static) -> &mut Self {
        self.handlers.error = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.socket.role()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.socket.state()
    }

    /// Returns `true` while [`start`](Self::start) is reading.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` once [`start`](Self::start) has delivered `on_close`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A cloneable handle for sending and closing, e.g. from inside handlers.
    #[must_use]
    pub fn sender(&self) -> MessageSender<T> {
        self.socket.sender()
    }

    /// Read and dispatch messages until the connection ends.
    ///
    /// Returns once a CLOSE message was handled or the read path failed.
    /// Neither case surfaces as an error: both end in `on_close`. Calling
    /// `start` again after that returns immediately.
    pub async fn start(&mut self) {
        if self.running || self.finished {
            return;
        }
        self.running = true;

        while self.running {
            match self.socket.read_message().await {
                Ok(message) => self.handle_message(message).await,
                Err(err) => self.handle_failure(err).await,
            }
        }
        self.finished = true;
    }

    /// Abort the transport. Sends no CLOSE frame.
    ///
    /// This needs the socket itself, so it cannot reach a loop that is
    /// running in [`start`](Self::start). To stop a running loop, call
    /// [`MessageSender::close`] on a handle taken from
    /// [`sender`](Self::sender) beforehand; the loop then fails its read and
    /// finishes through the failure path.
    pub async fn close(&self) {
        self.socket.close().await;
    }

    async fn handle_message(&mut self, message: Message) {
        let executor = self.executor.as_ref();
        match message.kind() {
            MessageType::Text => {
                let text = match String::from_utf8(message.into_payload()) {
                    Ok(text) => text,
                    Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
                };
                dispatch("text", self.handlers.text.as_ref(), executor, text);
            }
            MessageType::Binary => {
                dispatch("binary", self.handlers.binary.as_ref(), executor, message.into_payload());
            }
            MessageType::Ping => {
                dispatch("ping", self.handlers.ping.as_ref(), executor, message.into_payload());
            }
            MessageType::Pong => {
                dispatch("pong", self.handlers.pong.as_ref(), executor, message.into_payload());
            }
            MessageType::Close => {
                let info = CloseInfo::decode_lossy(message.payload());
                tracing::debug!(close = %info, "peer closed connection");
                dispatch("close", self.handlers.close.as_ref(), executor, info);
                self.socket.close().await;
                self.running = false;
            }
        }
    }

    async fn handle_failure(&mut self, err: Error) {
        tracing::warn!(error = %err, "websocket read loop terminated");

        let executor = self.executor.as_ref();
        let (local, peer) = close_infos(&err);
        dispatch("error", self.handlers.error.as_ref(), executor, err);
        dispatch("close", self.handlers.close.as_ref(), executor, local);

        if let Err(err) = self.socket.sender().send_close(peer).await {
            tracing::debug!(error = %err, "failed to send close frame");
        }
        self.socket.close().await;
        self.running = false;
    }
}

impl<T> SendMessage for EventSocket<T>
where
    T: AsyncRead + AsyncWrite + Send,
{
    fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + Send {
        SendMessage::send_message(&self.socket, message)
    }
}

/// Close info reported locally and sent to the peer after `err`.
fn close_infos(err: &Error) -> (CloseInfo, CloseInfo) {
    match err {
        Error::Protocol { code, message } => {
            let info = CloseInfo::of(*code, truncate_reason(message));
            (info.clone(), info)
        }
        _ => (
            CloseInfo::from(CloseCode::Abnormal),
            CloseInfo::from(CloseCode::GoingAway),
        ),
    }
}

/// Longest prefix of `reason` that fits a close frame, cut on a char boundary.
fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON_LEN {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON_LEN;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_close_infos() {
        let err = Error::protocol(CloseCode::MessageTooBig, "frame too large");
        let (local, peer) = close_infos(&err);
        assert_eq!(local, CloseInfo::of(1009, "frame too large"));
        assert_eq!(local, peer);
    }

    #[test]
    fn test_io_error_close_infos() {
        let (local, peer) = close_infos(&Error::closed());
        assert_eq!(local, CloseInfo::of(1006, "closed abnormally"));
        assert_eq!(peer, CloseInfo::of(1001, "going away"));
    }

    #[test]
    fn test_truncate_reason() {
        assert_eq!(truncate_reason("short"), "short");

        let long = "é".repeat(100);
        let cut = truncate_reason(&long);
        assert!(cut.len() <= MAX_CLOSE_REASON_LEN);
        assert_eq!(cut.len(), 122);
        assert!(CloseInfo::of(1002, cut).encode().is_ok());
    }
}
