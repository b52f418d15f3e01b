pub mod batches;
pub mod export;
pub mod import;
pub mod session;
pub mod tickets;
