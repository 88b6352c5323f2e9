use crate::error::AppError;
use bcrypt::{hash, verify};

/// The smallest work factor bcrypt accepts. Anything lower fails to hash.
pub const MIN_HASH_COST: u32 = 4;

/// Hashes `password` with a fresh salt at the given bcrypt work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
