// src/core/store/user.rs

//! The user collection and the admin upsert.
//!
//! Records are kept as raw JSON objects so that fields owned by the
//! application server survive a rewrite untouched. [`UserRecord`] is a typed
//! view used when a record needs to be read back.

use crate::core::credential::Credential;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";
/// Quota value meaning "unlimited".
pub const UNLIMITED_QUOTA: i64 = -1;

/// The on-disk shape of the user store (`users.json`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UsersFile {
    pub users: Vec<Value>,
    /// Top-level keys other than `users`, carried through on rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed view of a single user record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
    pub salt: String,
    pub pass_hash: String,
    pub quota: i64,
    pub unlocked: Vec<Value>,
    pub content_tokens: Vec<Value>,
    pub disabled: bool,
    pub access_until_ms: Option<i64>,
    pub created_at: String,
}

/// Whether the upsert appended a new record or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UsersFile {
    /// Parses a store file. Anything that is not an object with an array
    /// `users` field is an error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// The first record whose `username` matches, as a typed view.
    ///
    /// Returns `None` if there is no match or the match is missing fields.
    pub fn find(&self, username: &str) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|user| username_of(user) == Some(username))
            .and_then(|user| serde_json::from_value(user.clone()).ok())
    }

    /// The `id` of the first record whose `username` matches. Non-string ids
    /// are rendered as JSON text.
    pub fn id_of(&self, username: &str) -> Option<String> {
        let id = self
            .users
            .iter()
            .find(|user| username_of(user) == Some(username))?
            .get("id")?;
        match id {
            Value::String(id) => Some(id.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Number of records whose `username` matches.
    pub fn count(&self, username: &str) -> usize {
        self.users
            .iter()
            .filter(|user| username_of(user) == Some(username))
            .count()
    }

    /// Creates or rewrites the admin record for `username`.
    ///
    /// Only the first record with that username is touched. `email` replaces
    /// the stored address only when given. `now` becomes `createdAt` on new
    /// records and on records that lack a valid one.
    pub fn upsert_admin(
        &mut self,
        username: &str,
        credential: &Credential,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> UpsertOutcome {
        let created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        if let Some(record) = self
            .users
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|record| record.get("username").and_then(Value::as_str) == Some(username))
        {
            apply_admin_fields(record, username, credential, email, &created_at);
            return UpsertOutcome::Updated;
        }

        let mut record = Map::new();
        apply_admin_fields(&mut record, username, credential, email, &created_at);
        self.users.push(Value::Object(record));
        UpsertOutcome::Created
    }
}

fn username_of(user: &Value) -> Option<&str> {
    user.get("username").and_then(Value::as_str)
}

fn is_non_empty_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Writes the admin invariants into `record`, backfilling malformed defaults.
///
/// Applied to an empty map this produces a complete new record, keys in
/// canonical order.
fn apply_admin_fields(
    record: &mut Map<String, Value>,
    username: &str,
    credential: &Credential,
    email: Option<&str>,
    created_at: &str,
) {
    // Ids are opaque and owned by the application once set.
    if !record.contains_key("id") {
        record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    record.insert("username".into(), Value::String(username.to_string()));
    match email {
        Some(email) => {
            record.insert("email".into(), Value::String(email.to_string()));
        }
        None => {
            record.entry("email").or_insert(Value::Null);
        }
    }
    record.insert("role".into(), Value::String(ADMIN_ROLE.to_string()));
    record.insert("salt".into(), Value::String(credential.salt.clone()));
    record.insert("passHash".into(), Value::String(credential.pass_hash.clone()));

    if !record.get("quota").is_some_and(Value::is_number) {
        record.insert("quota".into(), Value::from(UNLIMITED_QUOTA));
    }
    for key in ["unlocked", "contentTokens"] {
        if !record.get(key).is_some_and(Value::is_array) {
            record.insert(key.into(), Value::Array(Vec::new()));
        }
    }

    record.insert("disabled".into(), Value::Bool(false));
    record.insert("accessUntilMs".into(), Value::Null);

    if !is_non_empty_string(record.get("createdAt")) {
        record.insert("createdAt".into(), Value::String(created_at.to_string()));
    }
}
