use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::close::{CloseCode, CloseInfo};
use crate::codec::{FrameSocket, FrameWriter};
use crate::config::Config;
use crate::connection::state::CloseHandshake;
use crate::connection::{ConnectionState, Role};
use crate::error::{Error, Result};
use crate::message::{Message, MessageType, SendMessage};
use crate::protocol::{Frame, MessageAssembler};

/// Message-level WebSocket endpoint.
///
/// `MessageSocket` reassembles fragmented messages, answers PING with PONG,
/// echoes the peer's CLOSE, and enforces the close handshake on sends. It
/// owns the read side; use [`sender`](Self::sender) to get handles that can
/// send from other tasks.
///
/// ## Example
///
/// ```rust,ignore
/// use wsstack::{Config, MessageSocket, Role, SendMessage};
///
/// let mut socket = MessageSocket::new(stream, Role::Client, Config::default());
/// socket.send_text("Hello").await?;
/// let reply = socket.read_message().await?;
/// socket.send_normal_close().await?;
/// socket.close().await;
/// ```
pub struct MessageSocket<T> {
    frames: FrameSocket<T>,
    assembler: MessageAssembler,
    sender: MessageSender<T>,
    validate_utf8: bool,
}

/// Cloneable send and close handle of a [`MessageSocket`].
///
/// All clones share the transport writer and the close-handshake flags.
pub struct MessageSender<T> {
    writer: FrameWriter<T>,
    handshake: Arc<CloseHandshake>,
}

impl<T> Clone for MessageSender<T> {
    fn clone(&self) -> Self {
        Self {
            writer: self.writer.clone(),
            handshake: Arc::clone(&self.handshake),
        }
    }
}

impl<T> std::fmt::Debug for MessageSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSender")
            .field("writer", &self.writer)
            .field("handshake", &self.handshake)
            .finish()
    }
}

impl<T> std::fmt::Debug for MessageSocket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageSocket")
            .field("frames", &self.frames)
            .field("assembling", &self.assembler.is_assembling())
            .field("validate_utf8", &self.validate_utf8)
            .finish_non_exhaustive()
    }
}

impl<T> MessageSocket<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a message socket over an upgraded stream.
    ///
    /// This does not perform the HTTP upgrade handshake.
    #[must_use]
    pub fn new(io: T, role: Role, config: Config) -> Self {
        let frames = FrameSocket::new(io, role, &config);
        Self::from_frame_socket(frames, &config)
    }

    /// Layer message handling on top of an existing frame socket.
    #[must_use]
    pub fn from_frame_socket(frames: FrameSocket<T>, config: &Config) -> Self {
        let sender = MessageSender {
            writer: frames.writer(),
            handshake: Arc::new(CloseHandshake::new()),
        };
        Self {
            frames,
            assembler: MessageAssembler::new(config.limits.max_message_size),
            sender,
            validate_utf8: config.validate_utf8,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.frames.role()
    }

    /// A cloneable handle for sending and closing from other tasks.
    #[must_use]
    pub fn sender(&self) -> MessageSender<T> {
        self.sender.clone()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.sender.state()
    }

    /// Read the next complete message.
    ///
    /// PING, PONG and CLOSE are returned as soon as they arrive, even in the
    /// middle of a fragmented message. Before a PING or CLOSE is returned, a
    /// PONG with the same payload or a normal CLOSE reply is sent. Reply
    /// failures are logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// - `Error::Io` on EOF, transport failure, or after [`close`](Self::close)
    /// - `Error::Protocol` for frame, fragmentation, size or UTF-8 violations
    pub async fn read_message(&mut self) -> Result<Message>
    where
        T: Send,
    {
        let assembled = loop {
            let frame = self.frames.read_frame().await?;
            if let Some(assembled) = self.assembler.push(frame)? {
                break assembled;
            }
        };

        let message = Message::new(MessageType::try_from(assembled.opcode)?, assembled.payload);
        if self.validate_utf8 {
            check_utf8(&message)?;
        }

        match message.kind() {
            MessageType::Close => {
                self.sender.handshake.mark_received();
                tracing::debug!(role = %self.role(), "close frame received");
                if let Err(err) = self.sender.send_normal_close().await {
                    tracing::debug!(error = %err, "failed to answer close frame");
                }
            }
            MessageType::Ping => {
                if let Err(err) = self.sender.send_pong(message.payload().to_vec()).await {
                    tracing::debug!(error = %err, "failed to answer ping");
                }
            }
            _ => {}
        }

        Ok(message)
    }

    /// Send one message. See [`MessageSender::send_message`].
    ///
    /// # Errors
    ///
    /// See [`MessageSender::send_message`].
    pub fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + '_ {
        self.sender.send_message(message)
    }

    /// Abort the transport. Idempotent; sends no CLOSE frame.
    pub async fn close(&self) {
        self.sender.close().await;
    }
}

impl<T> MessageSender<T> {
    #[must_use]
    pub fn role(&self) -> Role {
        self.writer.role()
    }

    /// Connection state as seen from the close handshake and the transport.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.writer.is_closed() {
            ConnectionState::Closed
        } else {
            self.handshake.state()
        }
    }
}

impl<T> MessageSender<T>
where
    T: AsyncWrite,
{
    /// Send one message as a single frame with fin set.
    ///
    /// Once CLOSE has been sent, further CLOSE messages are silently skipped.
    /// Only a successful CLOSE send counts as CLOSE sent.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` for a non-CLOSE message after CLOSE was sent or received
    /// - `Error::Protocol` if a control message payload exceeds 125 bytes
    /// - `Error::Io` on transport failure, or after [`close`](Self::close)
    pub async fn send_message(&self, message: Message) -> Result<()> {
        let kind = message.kind();
        if !self.handshake.admit(kind)? {
            tracing::debug!("close frame already sent, skipping");
            return Ok(());
        }

        let frame = Frame::new(true, kind.opcode(), message.into_payload());
        self.writer.send_frame(&frame).await?;

        if kind == MessageType::Close {
            self.handshake.mark_sent();
            tracing::debug!(role = %self.role(), "close frame sent");
        }
        Ok(())
    }

    /// Abort the transport. Idempotent; sends no CLOSE frame.
    pub async fn close(&self) {
        self.writer.close().await;
    }
}

impl<T> SendMessage for MessageSender<T>
where
    T: AsyncWrite + Send,
{
    fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + Send {
        MessageSender::send_message(self, message)
    }
}

impl<T> SendMessage for MessageSocket<T>
where
    T: AsyncRead + AsyncWrite + Send,
{
    fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + Send {
        MessageSender::send_message(&self.sender, message)
    }
}

/// Reject TEXT payloads and CLOSE reasons that are not valid UTF-8.
fn check_utf8(message: &Message) -> Result<()> {
    match message.kind() {
        MessageType::Text => std::str::from_utf8(message.payload())
            .map(|_| ())
            .map_err(|_| Error::protocol(CloseCode::InvalidPayload, "invalid utf-8 in text message")),
        MessageType::Close => CloseInfo::decode(message.payload()).map(|_| ()),
        _ => Ok(()),
    }
}
