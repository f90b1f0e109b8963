// src/bootstrap.rs

//! The bootstrap pipeline: validate, load, derive, upsert, persist.

use crate::config::Config;
use crate::core::credential::{KeyDerivation, ScryptKdf, derive_credential};
use crate::core::errors::BootstrapError;
use crate::core::store::{UpsertOutcome, UserStore};
use crate::core::validate::{AdminIdentity, resolve_identity};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// What a successful run did, for reporting to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub username: String,
    pub user_id: Option<String>,
    pub path: PathBuf,
    pub outcome: UpsertOutcome,
}

impl fmt::Display for BootstrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.outcome {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Updated => "updated",
        };
        writeln!(f, "Admin user '{}' {}.", self.username, action)?;
        if let Some(id) = &self.user_id {
            writeln!(f, "  id:   {id}")?;
        }
        writeln!(f, "  file: {}", self.path.display())?;
        write!(
            f,
            "Restart the server if it is running so it picks up the change."
        )
    }
}

/// Runs the bootstrap with the scrypt parameters from `config`.
pub async fn run(config: &Config) -> Result<BootstrapReport, BootstrapError> {
    let kdf = ScryptKdf::from_config(&config.kdf)
        .map_err(|e| BootstrapError::Config(format!("invalid kdf parameters: {e}")))?;
    run_with_kdf(config, Arc::new(kdf)).await
}

/// Runs the bootstrap with an explicit key derivation function.
///
/// Validation happens before the store is read; on any error the store on
/// disk is left as it was.
pub async fn run_with_kdf(
    config: &Config,
    kdf: Arc<dyn KeyDerivation>,
) -> Result<BootstrapReport, BootstrapError> {
    let AdminIdentity {
        username,
        password,
        email,
    } = resolve_identity(config)?;

    let store = UserStore::new(config.users_file());
    let mut users = store.load()?;

    let credential = derive_credential(kdf, password).await?;
    let outcome = users.upsert_admin(&username, &credential, email.as_deref(), Utc::now());

    store.persist(&users)?;
    info!("Admin user '{}' {:?} in '{}'.", username, outcome, store.path().display());

    Ok(BootstrapReport {
        user_id: users.id_of(&username),
        username,
        path: std::path::absolute(store.path()).unwrap_or_else(|_| store.path().to_path_buf()),
        outcome,
    })
}
