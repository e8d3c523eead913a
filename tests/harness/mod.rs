//! Test harness utilities for driving one endpoint against a raw peer.
//!
//! The endpoint under test owns one side of an in-memory duplex pipe; the
//! test plays the peer by writing and reading wire bytes on the other side.

#![allow(dead_code)]

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncWriteExt, DuplexStream};
use wsstack::protocol::apply_mask;
use wsstack::protocol::wire::{self, WireFrame};
use wsstack::{CloseInfo, OpCode};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-scoped fmt subscriber. Repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// An in-memory stream pair: `(endpoint side, peer side)`.
pub fn pipe() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(64 * 1024)
}

/// Encode a frame as a peer would send it, masking when `key` is set.
pub fn encode(fin: bool, opcode: OpCode, payload: &[u8], key: Option<[u8; 4]>) -> Vec<u8> {
    let mut payload = payload.to_vec();
    if let Some(key) = key {
        apply_mask(&mut payload, key);
    }
    let frame = WireFrame {
        fin,
        opcode: opcode.as_u8(),
        mask: key,
        payload_len: payload.len() as u64,
        payload,
        ..WireFrame::default()
    };
    let mut buf = BytesMut::new();
    frame.encode(&mut buf);
    buf.to_vec()
}

/// A masked frame, as sent by a client peer.
pub fn client_frame(fin: bool, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    encode(fin, opcode, payload, Some([0x37, 0xfa, 0x21, 0x3d]))
}

/// An unmasked frame, as sent by a server peer.
pub fn server_frame(fin: bool, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
    encode(fin, opcode, payload, None)
}

/// A masked CLOSE frame carrying `info`.
pub fn client_close(info: &CloseInfo) -> Vec<u8> {
    client_frame(true, OpCode::Close, &info.encode().unwrap())
}

pub async fn send_raw(peer: &mut DuplexStream, bytes: &[u8]) {
    peer.write_all(bytes).await.unwrap();
}

/// Read the next frame written by the endpoint, unmasking its payload.
///
/// The returned frame keeps its key in `mask` so tests can assert on it.
pub async fn recv_raw(peer: &mut DuplexStream) -> wsstack::Result<WireFrame> {
    tokio::time::timeout(TIMEOUT, async {
        let mut frame = wire::read_header(&mut *peer).await?;
        wire::read_payload(&mut frame, &mut *peer).await?;
        if let Some(key) = frame.mask {
            apply_mask(&mut frame.payload, key);
        }
        Ok(frame)
    })
    .await
    .expect("timed out waiting for a frame")
}

/// Read the next frame and decode it as a CLOSE payload.
pub async fn recv_close(peer: &mut DuplexStream) -> CloseInfo {
    let frame = recv_raw(peer).await.unwrap();
    assert_eq!(frame.opcode, OpCode::Close.as_u8(), "expected a CLOSE frame");
    CloseInfo::decode(&frame.payload).unwrap()
}
