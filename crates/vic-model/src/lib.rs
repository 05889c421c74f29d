//! Typed records for managed VMs and the decoder that produces them from
//! raw property bags.

pub mod address;
pub mod decode;
pub mod records;

pub use decode::{DecodeError, decode, decode_value};
pub use records::*;
