//! Protocol module containing the frame types and the JSON codec.

pub mod codec;
pub mod frames;

pub use codec::{decode_frame, decode_payload, encode_frame, FrameError};
pub use frames::{InboundFrame, OutboundFrame};
