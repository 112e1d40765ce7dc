//! Stream consumption: frame decoding and event parsing.
//!
//! Both stages are pure and synchronous. The decoder turns raw byte chunks
//! into delimiter-separated frames with decode state carried across chunk
//! boundaries; the parser classifies one frame at a time with no retained
//! state. Timing lives elsewhere (see [`crate::reveal`]).

pub mod decoder;
pub mod parser;

pub use decoder::FrameDecoder;
pub use parser::{FrameEvent, parse_frame};
