//! WebSocket protocol core implementation (RFC 6455).

pub mod assembler;
pub mod frame;
pub mod handshake;
pub mod mask;
pub mod opcode;
pub mod validation;
pub mod wire;

pub use assembler::{AssembledMessage, MessageAssembler};
pub use frame::{Frame, MAX_CONTROL_FRAME_PAYLOAD};
pub use handshake::{WS_GUID, compute_accept_key, generate_key};
pub use mask::{apply_mask, apply_mask_fast, random_mask_key};
pub use opcode::OpCode;
pub use validation::FrameValidator;
pub use wire::WireFrame;
