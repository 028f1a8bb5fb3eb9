/// Wire formats emitted by the relay.
pub mod cot;

pub use cot::{encode, CotEvent};
