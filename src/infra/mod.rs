//! Infrastructure adapters for scheduler storage.

pub mod queue;

pub use queue::PendingQueue;
