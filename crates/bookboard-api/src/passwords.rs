//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;
use crate::state::AppState;

pub struct Passwords {
    argon2: Argon2<'static>,
    /// Verified against when the username is unknown, so both login
    /// failures take the same time.
    dummy_hash: String,
}

impl Passwords {
    pub fn new(argon2: Argon2<'static>) -> Result<Self, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(salt.as_str().as_bytes(), &salt)?
            .to_string();

        Ok(Self { argon2, dummy_hash })
    }

    pub fn hash(&self, password: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self.argon2.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    /// `stored` is the user's hash, or `None` for an unknown user (always false).
    pub fn verify(&self, password: &str, stored: Option<&str>) -> Result<bool, password_hash::Error> {
        let parsed = PasswordHash::new(stored.unwrap_or(&self.dummy_hash))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(stored.is_some()),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether `value` parses as an Argon2 PHC string.
    pub fn is_hash(value: &str) -> bool {
        PasswordHash::new(value).is_ok_and(|hash| Algorithm::try_from(hash.algorithm).is_ok())
    }
}

pub async fn hash_password(state: &AppState, password: String) -> Result<String, ApiError> {
    let state = state.clone();
    let hash = tokio::task::spawn_blocking(move || state.passwords.hash(&password)).await??;
    Ok(hash)
}

pub async fn verify_password(
    state: &AppState,
    password: String,
    stored: Option<String>,
) -> Result<bool, ApiError> {
    let state = state.clone();
    let ok = tokio::task::spawn_blocking(move || state.passwords.verify(&password, stored.as_deref()))
        .await??;
    Ok(ok)
}

#[cfg(test)]
pub(crate) fn cheap_argon2() -> Argon2<'static> {
    let params = argon2::Params::new(8, 1, 1, None).unwrap();
    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}
