//! Password hashing and bearer tokens

pub mod hash;
pub mod token;

pub use token::{Claims, TokenKind};
