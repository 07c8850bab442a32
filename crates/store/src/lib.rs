#![doc = include_str!("../README.md")]

pub mod cursor;
pub mod error;
pub mod schema;
pub mod store;
pub mod writer;

// --- 주요 타입 re-export ---

pub use cursor::CursorState;
pub use error::StoreError;
pub use store::LogStore;
pub use writer::{InsertOutcome, LogRecord};
