//! Password hashing and the in-memory account registry behind the
//! `accounts` auth backend.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};

use crate::identity::Identity;

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

/// Registered accounts keyed by lowercased email. Lives for the process only.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
}

fn key_for(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AccountRegistry {
    pub fn new() -> Self { Self::default() }

    /// Stores `identity` under its email. Returns `Ok(false)` if the email is taken.
    pub fn register(&self, identity: Identity, password: &str) -> Result<bool> {
        let key = key_for(&identity.email);
        if self.accounts.read().contains_key(&key) {
            return Ok(false);
        }
        // hash outside the write lock
        let password_hash = hash_password(password)?;
        let mut map = self.accounts.write();
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, Account { identity, password_hash });
        Ok(true)
    }

    /// Identity stored for `email` when `password` matches.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<Identity> {
        let account = self.accounts.read().get(&key_for(email)).cloned()?;
        if verify_password(&account.password_hash, password) {
            Some(account.identity)
        } else {
            None
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.accounts.read().contains_key(&key_for(email))
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
