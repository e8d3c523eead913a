//! Raw frame codec (RFC 6455 Section 5.2).
//!
//! Converts between bytes on the stream and [`WireFrame`] records. The codec
//! parses structure only: it never checks opcodes, reserved bits, masking
//! rules or control-frame limits, and never masks or unmasks payloads.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                 Masking key (if MASK is set)                  |
//! +---------------------------------------------------------------+
//! |                         Payload data                          |
//! +---------------------------------------------------------------+
//! ```

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::close::CloseCode;
use crate::error::{Error, Result};

/// Largest payload length encoded directly in the 7-bit field.
const MAX_DIRECT_LEN: u64 = 125;
/// Marker for a 16-bit extended length.
const EXTENDED_16: u8 = 126;
/// Marker for a 64-bit extended length.
const EXTENDED_64: u8 = 127;

/// An unvalidated frame exactly as it appears on the wire.
///
/// When `mask` is set, `payload` holds the masked bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireFrame {
    /// Final fragment flag.
    pub fin: bool,
    /// Reserved bit 1.
    pub rsv1: bool,
    /// Reserved bit 2.
    pub rsv2: bool,
    /// Reserved bit 3.
    pub rsv3: bool,
    /// Raw 4-bit opcode.
    pub opcode: u8,
    /// Masking key, present iff the MASK bit is set.
    pub mask: Option<[u8; 4]>,
    /// Declared payload length.
    pub payload_len: u64,
    /// Payload bytes, filled by [`read_payload`].
    pub payload: Vec<u8>,
}

impl WireFrame {
    /// Returns `true` if the MASK bit is set.
    #[inline]
    #[must_use]
    pub const fn masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Number of header bytes this frame occupies on the wire.
    #[must_use]
    pub const fn header_len(&self) -> usize {
        let extended = if self.payload_len <= MAX_DIRECT_LEN {
            0
        } else if self.payload_len <= u16::MAX as u64 {
            2
        } else {
            8
        };
        let mask = if self.mask.is_some() { 4 } else { 0 };
        2 + extended + mask
    }

    /// Append header and payload to `buf` using the minimal length encoding.
    ///
    /// The length field is taken from `payload_len`, which callers keep
    /// equal to `payload.len()`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.header_len() + self.payload.len());

        let mut byte0 = self.opcode & 0x0F;
        if self.fin {
            byte0 |= 0x80;
        }
        if self.rsv1 {
            byte0 |= 0x40;
        }
        if self.rsv2 {
            byte0 |= 0x20;
        }
        if self.rsv3 {
            byte0 |= 0x10;
        }
        buf.put_u8(byte0);

        let mask_bit = if self.mask.is_some() { 0x80 } else { 0x00 };
        let len = self.payload_len;
        if len <= MAX_DIRECT_LEN {
            buf.put_u8(mask_bit | len as u8);
        } else if len <= u16::MAX as u64 {
            buf.put_u8(mask_bit | EXTENDED_16);
            buf.put_u16(len as u16);
        } else {
            buf.put_u8(mask_bit | EXTENDED_64);
            buf.put_u64(len);
        }

        if let Some(key) = self.mask {
            buf.put_slice(&key);
        }
        buf.put_slice(&self.payload);
    }
}

/// Longest possible header: 2 fixed bytes, 8 length bytes, 4 key bytes.
pub const MAX_HEADER_LEN: usize = 14;

/// Header length announced by the second header byte.
const fn header_len_for(byte1: u8) -> usize {
    let extended = match byte1 & 0x7F {
        EXTENDED_16 => 2,
        EXTENDED_64 => 8,
        _ => 0,
    };
    let mask = if byte1 & 0x80 != 0 { 4 } else { 0 };
    2 + extended + mask
}

/// Parse a frame header from the front of `buf` without consuming it.
///
/// Returns the header (with an empty payload) and its length in bytes, or
/// `None` while `buf` does not yet hold the whole header.
#[must_use]
pub fn parse_header(buf: &[u8]) -> Option<(WireFrame, usize)> {
    let (&byte0, &byte1) = (buf.first()?, buf.get(1)?);
    let header_len = header_len_for(byte1);
    if buf.len() < header_len {
        return None;
    }

    let (payload_len, key_at) = match byte1 & 0x7F {
        EXTENDED_16 => (u64::from(u16::from_be_bytes([buf[2], buf[3]])), 4),
        EXTENDED_64 => {
            let mut len = [0u8; 8];
            len.copy_from_slice(&buf[2..10]);
            (u64::from_be_bytes(len), 10)
        }
        len => (u64::from(len), 2),
    };

    let mask = (byte1 & 0x80 != 0)
        .then(|| [buf[key_at], buf[key_at + 1], buf[key_at + 2], buf[key_at + 3]]);

    let frame = WireFrame {
        fin: byte0 & 0x80 != 0,
        rsv1: byte0 & 0x40 != 0,
        rsv2: byte0 & 0x20 != 0,
        rsv3: byte0 & 0x10 != 0,
        opcode: byte0 & 0x0F,
        mask,
        payload_len,
        payload: Vec::new(),
    };
    Some((frame, header_len))
}

/// Convert a declared payload length to an in-memory size.
///
/// # Errors
///
/// Returns `Error::Protocol` (1009) if the length does not fit in memory on
/// this platform.
pub fn payload_size(payload_len: u64) -> Result<usize> {
    usize::try_from(payload_len)
        .map_err(|_| Error::protocol(CloseCode::MessageTooBig, "frame too large"))
}

/// Read a frame header: flags, opcode, length and masking key.
///
/// The returned frame has an empty payload; call [`read_payload`] once the
/// declared length has been checked. Bytes already read are lost if the
/// future is dropped, so a stream that must survive cancellation should be
/// buffered and decoded with [`parse_header`] instead.
///
/// # Errors
///
/// Returns `Error::Io` if the stream ends or fails before the header is complete.
pub async fn read_header<R>(reader: &mut R) -> Result<WireFrame>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; MAX_HEADER_LEN];
    reader.read_exact(&mut header[..2]).await?;
    let header_len = header_len_for(header[1]);
    reader.read_exact(&mut header[2..header_len]).await?;

    parse_header(&header[..header_len])
        .map(|(frame, _)| frame)
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into())
}

/// Read exactly `frame.payload_len` bytes into `frame.payload`.
///
/// # Errors
///
/// - `Error::Protocol` (1009) if the length does not fit in memory on this platform
/// - `Error::Io` if the stream ends or fails before the payload is complete
pub async fn read_payload<R>(frame: &mut WireFrame, reader: &mut R) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut payload = vec![0u8; payload_size(frame.payload_len)?];
    reader.read_exact(&mut payload).await?;
    frame.payload = payload;
    Ok(())
}

/// Write a whole frame as one buffered write, then flush.
///
/// # Errors
///
/// Returns `Error::Io` if the stream fails.
pub async fn write_frame<W>(frame: &WireFrame, writer: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::new();
    frame.encode(&mut buf);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
