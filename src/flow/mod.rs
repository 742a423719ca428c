//! Flow Module - per-edge path counts for table rows
//!
//! - `quota`: even quotient/remainder split of a deficit
//! - `manager`: edge flow storage and deficit computation
//! - `initialiser`: the two-pass balancing traversal

mod initialiser;
mod manager;
mod quota;

pub use initialiser::{FlowInitialiser, InitStats};
pub use manager::{EdgeFlow, FlowManager};
pub use quota::split_evenly;
