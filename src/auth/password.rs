//! Password hashing and secret generation.
//!
//! Passwords are stored as Argon2 PHC strings. Generated secrets (initial
//! passwords, a signing key when none is configured) are drawn uniformly from
//! the configured character list.

use crate::errors::Result;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distributions::Alphanumeric, seq::SliceRandom};

/// Hashes `password` with a fresh salt.
///
/// # Errors
/// Returns [`crate::errors::Error::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash.
///
/// # Errors
/// Returns [`crate::errors::Error::PasswordHash`] if the stored hash cannot be
/// parsed. A wrong password is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Random string of `length` characters drawn from `character_list`.
///
/// Falls back to ASCII alphanumerics when the list is empty.
#[must_use]
pub fn generate_secret(length: usize, character_list: &str) -> String {
    let characters: Vec<char> = character_list.chars().collect();
    let mut rng = rand::thread_rng();

    if characters.is_empty() {
        return (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
    }

    (0..length)
        .filter_map(|_| characters.choose(&mut rng))
        .collect()
}
