//! Back office services over the storage port

pub mod batches;
pub mod sessions;
pub mod tickets;
