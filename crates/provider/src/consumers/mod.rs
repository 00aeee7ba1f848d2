//! Consumer implementations
//!
//! Contains LogConsumer and JsonlConsumer.

mod jsonl;
mod log;

pub use self::jsonl::JsonlConsumer;
pub use self::log::LogConsumer;
