// src/core/credential.rs

//! Password credential derivation.
//!
//! A credential is a fresh random salt plus the key derived from the password
//! and that salt, both hex-encoded as they are stored in the user record.

use crate::config::KdfConfig;
use crate::core::errors::BootstrapError;
use rand::RngCore;
use rand::rngs::OsRng;
use scrypt::Params;
use scrypt::errors::InvalidParams;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Length in bytes of the random salt.
pub const SALT_LEN: usize = 16;
/// Length in bytes of the derived key.
pub const DERIVED_KEY_LEN: usize = 64;

/// Derives a fixed-length key from a password and a salt.
///
/// Implementations must be deterministic for a given `(password, salt)` pair
/// and fill the whole of `out`.
pub trait KeyDerivation: Send + Sync {
    fn derive_key(&self, password: &[u8], salt: &[u8], out: &mut [u8])
    -> Result<(), BootstrapError>;
}

/// scrypt with tunable cost factors.
#[derive(Debug, Clone)]
pub struct ScryptKdf {
    params: Params,
}

impl ScryptKdf {
    pub fn from_config(config: &KdfConfig) -> Result<Self, InvalidParams> {
        let params = Params::new(config.log_n, config.r, config.p, DERIVED_KEY_LEN)?;
        Ok(Self { params })
    }
}

impl KeyDerivation for ScryptKdf {
    fn derive_key(
        &self,
        password: &[u8],
        salt: &[u8],
        out: &mut [u8],
    ) -> Result<(), BootstrapError> {
        scrypt::scrypt(password, salt, &self.params, out)
            .map_err(|e| BootstrapError::KeyDerivation(e.to_string()))
    }
}

/// A hex-encoded salt and derived key, ready to be written to a user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub salt: String,
    pub pass_hash: String,
}

/// Generates a new salt and derives the key for `password` on the current thread.
pub fn derive_credential_blocking(
    kdf: &dyn KeyDerivation,
    password: &str,
) -> Result<Credential, BootstrapError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| BootstrapError::KeyDerivation(format!("failed to generate salt: {e}")))?;

    let mut key = [0u8; DERIVED_KEY_LEN];
    kdf.derive_key(password.as_bytes(), &salt, &mut key)?;

    Ok(Credential {
        salt: hex::encode(salt),
        pass_hash: hex::encode(key),
    })
}

/// Derives a fresh credential on the blocking thread pool.
///
/// This is CPU and memory heavy; it is the only step of the bootstrap that
/// yields to the runtime.
pub async fn derive_credential(
    kdf: Arc<dyn KeyDerivation>,
    password: String,
) -> Result<Credential, BootstrapError> {
    let start_time = Instant::now();
    let result =
        tokio::task::spawn_blocking(move || derive_credential_blocking(kdf.as_ref(), &password))
            .await;

    match result {
        Ok(Ok(credential)) => {
            debug!("Derived password credential in {:?}", start_time.elapsed());
            Ok(credential)
        }
        Ok(Err(e)) => Err(e),
        Err(join_err) => Err(BootstrapError::KeyDerivation(format!(
            "derivation task panicked: {join_err}"
        ))),
    }
}
