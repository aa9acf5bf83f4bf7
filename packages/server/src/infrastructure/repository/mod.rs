//! Repository の実装
//!
//! - `inmemory`: プロセス内の Vec を使った実装

mod inmemory;

pub use inmemory::InMemorySessionRepository;
