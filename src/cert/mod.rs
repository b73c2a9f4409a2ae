//! Certificate codec: big-endian framing, decider tags, dvf/umf formats.

pub mod codec;
pub mod dvf;
pub mod tags;
pub mod umf;
