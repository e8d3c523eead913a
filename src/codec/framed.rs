use std::future::Future;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{Mutex, watch};

use crate::close::CloseCode;
use crate::config::Config;
use crate::connection::Role;
use crate::error::{Error, Result};
use crate::protocol::mask::{apply_mask_fast, random_mask_key};
use crate::protocol::validation::FrameValidator;
use crate::protocol::wire::{self, WireFrame};
use crate::protocol::Frame;

/// Initial read buffer capacity, and the minimum headroom for each read.
const READ_CHUNK: usize = 4096;

/// Frame-level WebSocket endpoint over a split byte stream.
///
/// The socket owns the read half and is the single reader of the
/// connection. Incoming bytes collect in a read buffer until a whole frame
/// is available, so a dropped [`read_frame`](Self::read_frame) loses no
/// data. Writes go through a [`FrameWriter`], which can be cloned and used
/// from any number of tasks.
pub struct FrameSocket<T> {
    reader: ReadHalf<T>,
    read_buf: BytesMut,
    writer: FrameWriter<T>,
    validator: FrameValidator,
}

/// Cloneable write handle of a [`FrameSocket`].
///
/// Every frame is encoded and written while holding the write lock, so
/// concurrent senders never interleave bytes on the wire.
pub struct FrameWriter<T> {
    inner: Arc<WriterInner<T>>,
}

struct WriterInner<T> {
    io: Mutex<WriteHalf<T>>,
    role: Role,
    closed: watch::Sender<bool>,
}

impl<T> Clone for FrameWriter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for FrameSocket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSocket")
            .field("role", &self.writer.inner.role)
            .field("closed", &self.writer.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T> std::fmt::Debug for FrameWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter")
            .field("role", &self.inner.role)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Resolves once the closed flag is set.
async fn closed_signal(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Run `fut` unless the connection is closed first.
///
/// The closed signal wins ties, so nothing is read or written once it is set.
async fn until_closed<F>(closed: &watch::Sender<bool>, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = closed_signal(closed.subscribe()) => Err(Error::closed()),
        out = fut => Ok(out),
    }
}

/// Fill `buf` from `reader` until it holds a whole frame, then validate it.
async fn next_frame<T>(
    reader: &mut ReadHalf<T>,
    buf: &mut BytesMut,
    validator: &FrameValidator,
) -> Result<Frame>
where
    T: AsyncRead,
{
    loop {
        if let Some(wire) = take_frame(buf, validator)? {
            return validator.validate(wire);
        }

        buf.reserve(READ_CHUNK);
        if reader.read_buf(buf).await? == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
    }
}

/// Split the next complete frame off the front of `buf`.
///
/// A frame whose declared length is rejected has only its header removed.
fn take_frame(buf: &mut BytesMut, validator: &FrameValidator) -> Result<Option<WireFrame>> {
    let Some((mut wire, header_len)) = wire::parse_header(buf) else {
        return Ok(None);
    };

    if let Err(err) = validator.check_length(wire.payload_len) {
        buf.advance(header_len);
        return Err(err);
    }

    let frame_len = header_len
        .checked_add(wire::payload_size(wire.payload_len)?)
        .ok_or_else(|| Error::protocol(CloseCode::MessageTooBig, "frame too large"))?;
    if buf.len() < frame_len {
        buf.reserve(frame_len - buf.len());
        return Ok(None);
    }

    let mut bytes = buf.split_to(frame_len);
    bytes.advance(header_len);
    wire.payload = bytes.to_vec();
    Ok(Some(wire))
}

impl<T> FrameSocket<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Take ownership of an upgraded stream.
    #[must_use]
    pub fn new(io: T, role: Role, config: &Config) -> Self {
        let (reader, writer) = tokio::io::split(io);
        let (closed, _) = watch::channel(false);
        Self {
            reader,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            writer: FrameWriter {
                inner: Arc::new(WriterInner {
                    io: Mutex::new(writer),
                    role,
                    closed,
                }),
            },
            validator: FrameValidator::new(role, config.limits.clone()),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.validator.role()
    }

    /// A cloneable handle for sending frames and closing the transport.
    #[must_use]
    pub fn writer(&self) -> FrameWriter<T> {
        self.writer.clone()
    }

    /// Read and validate the next frame.
    ///
    /// The declared length is checked before any payload byte is buffered.
    /// Cancel-safe: bytes of a partly received frame stay buffered for the
    /// next call.
    ///
    /// # Errors
    ///
    /// - `Error::Io` on EOF, transport failure, or after [`close`](Self::close)
    /// - `Error::Protocol` for any single-frame violation
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let Self {
            reader,
            read_buf,
            writer,
            validator,
        } = self;

        let frame = until_closed(
            &writer.inner.closed,
            next_frame(reader, read_buf, validator),
        )
        .await??;

        tracing::trace!(
            opcode = %frame.opcode(),
            fin = frame.fin(),
            len = frame.payload().len(),
            "frame received"
        );
        Ok(frame)
    }

    /// Send one frame. See [`FrameWriter::send_frame`].
    ///
    /// # Errors
    ///
    /// See [`FrameWriter::send_frame`].
    pub async fn send_frame(&self, frame: &Frame) -> Result<()> {
        self.writer.send_frame(frame).await
    }

    /// Abort the transport. See [`FrameWriter::close`].
    pub async fn close(&self) {
        self.writer.close().await;
    }
}

impl<T> FrameWriter<T> {
    #[must_use]
    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Returns `true` once `close` has been called on any handle.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }
}

impl<T> FrameWriter<T>
where
    T: AsyncWrite,
{
    /// Encode and write one frame, masking it with a fresh key when acting
    /// as a client.
    ///
    /// # Errors
    ///
    /// - `Error::Protocol` if a control frame breaks the RFC 6455 constraints
    /// - `Error::Io` on transport failure, or after [`close`](Self::close)
    pub async fn send_frame(&self, frame: &Frame) -> Result<()> {
        frame.check_control()?;

        let mut payload = frame.payload().to_vec();
        let mask = if self.inner.role.must_mask() {
            let key = random_mask_key()?;
            apply_mask_fast(&mut payload, key);
            Some(key)
        } else {
            None
        };

        let wire = WireFrame {
            fin: frame.fin(),
            opcode: frame.opcode().as_u8(),
            mask,
            payload_len: payload.len() as u64,
            payload,
            ..WireFrame::default()
        };

        until_closed(&self.inner.closed, async {
            let mut io = self.inner.io.lock().await;
            wire::write_frame(&wire, &mut *io).await
        })
        .await??;

        tracing::trace!(
            opcode = %frame.opcode(),
            fin = frame.fin(),
            len = frame.payload().len(),
            "frame sent"
        );
        Ok(())
    }

    /// Abort the transport without sending any protocol frame.
    ///
    /// Pending and later reads and writes on every handle fail with
    /// `Error::Io`. Calling this more than once has no further effect.
    pub async fn close(&self) {
        if self.inner.closed.send_replace(true) {
            return;
        }
        tracing::debug!(role = %self.inner.role, "closing transport");

        let mut io = self.inner.io.lock().await;
        if let Err(err) = io.shutdown().await {
            tracing::debug!(error = %err, "transport shutdown failed");
        }
    }
}
