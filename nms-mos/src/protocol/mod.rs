//! MOS wire protocol: framing, classification, extraction, parsing, acks

pub mod ack;
pub mod classifier;
pub mod extract;
pub mod framing;
pub mod messages;
pub mod scanner;

pub use ack::{build_ack, AckStatus, RoAck, ACK_TERMINATOR};
pub use classifier::{classify, first_start_tag, has_envelope, CommandKind};
pub use extract::extract;
pub use framing::{Frame, FrameAccumulator};
pub use messages::MosCommand;
