//! WebSocket messages and the sending conveniences shared by every layer.

use std::future::Future;

use crate::close::{CloseCode, CloseInfo};
use crate::error::{Error, Result};
use crate::protocol::OpCode;

/// Kind of a complete WebSocket message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl MessageType {
    /// Opcode of the single frame carrying a message of this kind.
    #[must_use]
    pub const fn opcode(self) -> OpCode {
        match self {
            MessageType::Text => OpCode::Text,
            MessageType::Binary => OpCode::Binary,
            MessageType::Close => OpCode::Close,
            MessageType::Ping => OpCode::Ping,
            MessageType::Pong => OpCode::Pong,
        }
    }

    /// Returns `true` for CLOSE, PING and PONG.
    #[must_use]
    pub const fn is_control(self) -> bool {
        self.opcode().is_control()
    }
}

impl TryFrom<OpCode> for MessageType {
    type Error = Error;

    fn try_from(opcode: OpCode) -> Result<Self> {
        match opcode {
            OpCode::Text => Ok(MessageType::Text),
            OpCode::Binary => Ok(MessageType::Binary),
            OpCode::Close => Ok(MessageType::Close),
            OpCode::Ping => Ok(MessageType::Ping),
            OpCode::Pong => Ok(MessageType::Pong),
            OpCode::Continuation => Err(Error::protocol(
                CloseCode::ProtocolError,
                "unexpected continuation frame",
            )),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode())
    }
}

/// A complete message: its kind and the whole payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageType,
    payload: Vec<u8>,
}

impl Message {
    #[must_use]
    pub fn new(kind: MessageType, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(MessageType::Text, text.into().into_bytes())
    }

    /// Create a binary message.
    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageType::Binary, data)
    }

    /// Create a ping message.
    #[must_use]
    pub fn ping(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageType::Ping, data)
    }

    /// Create a pong message.
    #[must_use]
    pub fn pong(data: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageType::Pong, data)
    }

    /// Create a close message carrying `info`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the reason is longer than 123 bytes.
    pub fn close(info: &CloseInfo) -> Result<Self> {
        Ok(Self::new(MessageType::Close, info.encode()?))
    }

    #[must_use]
    pub const fn kind(&self) -> MessageType {
        self.kind
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Borrow the payload as text, if this is a TEXT message holding valid UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self.kind {
            MessageType::Text => std::str::from_utf8(&self.payload).ok(),
            _ => None,
        }
    }

    /// Close info carried by a CLOSE message. Invalid UTF-8 in the reason is replaced.
    #[must_use]
    pub fn close_info(&self) -> Option<CloseInfo> {
        match self.kind {
            MessageType::Close => Some(CloseInfo::decode_lossy(&self.payload)),
            _ => None,
        }
    }
}

/// Sending API shared by message senders and sockets.
///
/// Only [`send_message`](Self::send_message) is required; every other method
/// builds a [`Message`] and delegates to it.
pub trait SendMessage {
    /// Send one complete message as a single frame.
    fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + Send;

    fn send_text(&self, text: impl Into<String>) -> impl Future<Output = Result<()>> + Send {
        self.send_message(Message::text(text))
    }

    fn send_binary(&self, data: impl Into<Vec<u8>>) -> impl Future<Output = Result<()>> + Send {
        self.send_message(Message::binary(data))
    }

    fn send_ping(&self, data: impl Into<Vec<u8>>) -> impl Future<Output = Result<()>> + Send {
        self.send_message(Message::ping(data))
    }

    fn send_pong(&self, data: impl Into<Vec<u8>>) -> impl Future<Output = Result<()>> + Send {
        self.send_message(Message::pong(data))
    }

    /// Send a CLOSE message. Does not close the transport.
    fn send_close(&self, info: CloseInfo) -> impl Future<Output = Result<()>> + Send {
        let sent = Message::close(&info).map(|message| self.send_message(message));
        async move { sent?.await }
    }

    fn send_close_with(
        &self,
        code: u16,
        reason: impl Into<String>,
    ) -> impl Future<Output = Result<()>> + Send {
        self.send_close(CloseInfo::of(code, reason))
    }

    /// Send CLOSE with 1000 "normal close".
    fn send_normal_close(&self) -> impl Future<Output = Result<()>> + Send {
        self.send_close(CloseInfo::from(CloseCode::Normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Message>>,
    }

    impl SendMessage for Recorder {
        fn send_message(&self, message: Message) -> impl Future<Output = Result<()>> + Send {
            self.sent.lock().unwrap().push(message);
            std::future::ready(Ok(()))
        }
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::text("hello");
        assert_eq!(msg.kind(), MessageType::Text);
        assert_eq!(msg.payload(), b"hello");
        assert_eq!(msg.as_text(), Some("hello"));

        let msg = Message::binary([1, 2, 3]);
        assert_eq!(msg.kind(), MessageType::Binary);
        assert_eq!(msg.as_text(), None);
        assert_eq!(msg.into_payload(), vec![1, 2, 3]);
    }

    #[test]
    fn test_close_message() {
        let msg = Message::close(&CloseInfo::of(4000, "bye")).unwrap();
        assert_eq!(msg.kind(), MessageType::Close);
        assert_eq!(msg.close_info(), Some(CloseInfo::of(4000, "bye")));
        assert_eq!(Message::ping(vec![]).close_info(), None);
    }

    #[test]
    fn test_close_message_reason_too_long() {
        let err = Message::close(&CloseInfo::of(1000, "x".repeat(124))).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_message_type_from_opcode() {
        assert_eq!(MessageType::try_from(OpCode::Ping).unwrap(), MessageType::Ping);
        assert_eq!(MessageType::Pong.opcode(), OpCode::Pong);
        assert!(MessageType::Close.is_control());
        assert!(!MessageType::Text.is_control());

        let err = MessageType::try_from(OpCode::Continuation).unwrap_err();
        assert_eq!(err.close_code(), Some(1002));
    }

    #[tokio::test]
    async fn test_conveniences_build_messages() {
        let recorder = Recorder::default();
        recorder.send_text("a").await.unwrap();
        recorder.send_binary(vec![1]).await.unwrap();
        recorder.send_ping(vec![2]).await.unwrap();
        recorder.send_pong(vec![3]).await.unwrap();
        recorder.send_close_with(4001, "done").await.unwrap();
        recorder.send_normal_close().await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        let kinds: Vec<_> = sent.iter().map(Message::kind).collect();
        assert_eq!(
            kinds,
            vec![
                MessageType::Text,
                MessageType::Binary,
                MessageType::Ping,
                MessageType::Pong,
                MessageType::Close,
                MessageType::Close,
            ]
        );
        assert_eq!(sent[4].payload(), b"\x0f\xa1done");
        assert_eq!(sent[5].payload(), b"\x03\xe8normal close");
    }
}
