//! bcrypt wrappers

use crate::errors::Result;

pub const DEFAULT_COST: u32 = 10;

/// Smallest cost bcrypt accepts (the crate keeps its own copy private)
pub const MIN_COST: u32 = 4;

pub fn make(plain: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(plain, cost)?)
}

pub fn check(plain: &str, hashed: &str) -> Result<bool> {
    Ok(bcrypt::verify(plain, hashed)?)
}
