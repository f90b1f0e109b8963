// tests/integration/bootstrap_test.rs

//! End-to-end runs of the bootstrap pipeline against a scratch data directory

use super::test_helpers::TestContext;
use admin_bootstrap::core::BootstrapError;
use admin_bootstrap::core::store::UpsertOutcome;
use serde_json::{Value, json};

#[tokio::test]
async fn test_creates_admin_in_empty_store() {
    let ctx = TestContext::admin();

    let report = ctx.run().await.unwrap();
    assert_eq!(report.username, "root-ops");
    assert_eq!(report.outcome, UpsertOutcome::Created);
    assert!(report.path.ends_with("data/users.json"));
    assert!(report.path.is_absolute());

    let users = ctx.users();
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user["username"], "root-ops");
    assert_eq!(user["role"], "admin");
    assert_eq!(user["disabled"], false);
    assert_eq!(user["accessUntilMs"], Value::Null);
    assert_eq!(user["quota"], -1);
    assert_eq!(user["unlocked"], json!([]));
    assert_eq!(user["contentTokens"], json!([]));
    assert_eq!(user["email"], Value::Null);
    assert_eq!(user["salt"].as_str().unwrap().len(), 32);
    assert_eq!(user["passHash"].as_str().unwrap().len(), 128);
    assert!(
        user["passHash"]
            .as_str()
            .unwrap()
            .chars()
            .all(|c| c.is_ascii_hexdigit())
    );
    assert_eq!(report.user_id.as_deref(), user["id"].as_str());
}

#[tokio::test]
async fn test_store_file_is_pretty_json_with_trailing_newline() {
    let ctx = TestContext::admin();
    ctx.run().await.unwrap();

    let raw = ctx.read_store_raw();
    assert!(raw.starts_with("{\n  \"users\": ["));
    assert!(raw.ends_with("}\n"));
}

#[tokio::test]
async fn test_second_run_updates_same_record_and_rotates_credential() {
    let ctx = TestContext::admin();

    let first = ctx.run().await.unwrap();
    let before = ctx.users()[0].clone();

    let second = ctx.run().await.unwrap();
    assert_eq!(second.outcome, UpsertOutcome::Updated);
    assert_eq!(first.user_id, second.user_id);

    let users = ctx.users();
    assert_eq!(users.len(), 1);
    let after = &users[0];
    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["createdAt"], before["createdAt"]);
    assert_ne!(after["salt"], before["salt"]);
    assert_ne!(after["passHash"], before["passHash"]);
}

#[tokio::test]
async fn test_email_is_normalized_and_kept_when_not_resupplied() {
    let ctx = TestContext::new(&[
        ("ADMIN_USERNAME", "root-ops"),
        ("ADMIN_PASSWORD", "correcthorse1"),
        ("ADMIN_EMAIL", "  Ops@Example.COM "),
    ]);
    ctx.run().await.unwrap();
    assert_eq!(ctx.users()[0]["email"], "ops@example.com");

    let mut config = ctx.config.clone();
    config.admin_email = Some(String::new());
    admin_bootstrap::bootstrap::run_with_kdf(&config, super::test_helpers::fast_kdf())
        .await
        .unwrap();
    assert_eq!(ctx.users()[0]["email"], "ops@example.com");
}

#[tokio::test]
async fn test_corrupt_store_is_replaced() {
    let ctx = TestContext::admin();
    ctx.write_store("{ this is not json");

    let report = ctx.run().await.unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Created);

    let users = ctx.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "root-ops");
}

#[tokio::test]
async fn test_store_with_wrong_shape_is_replaced() {
    let ctx = TestContext::admin();
    ctx.write_store(r#"{"users": {"root-ops": {}}}"#);

    ctx.run().await.unwrap();
    assert_eq!(ctx.users().len(), 1);
}

#[tokio::test]
async fn test_existing_users_and_unknown_fields_survive() {
    let ctx = TestContext::admin();
    ctx.write_store(
        r#"{
  "users": [
    {"id": "u-1", "username": "alice", "role": "user", "quota": 10, "theme": "dark"},
    {"id": "u-2", "username": "root-ops", "role": "user", "quota": 5,
     "unlocked": ["a"], "contentTokens": "oops", "createdAt": "2020-01-01T00:00:00.000Z",
     "disabled": true, "accessUntilMs": 123, "theme": "light"}
  ],
  "version": 3
}"#,
    );

    let report = ctx.run().await.unwrap();
    assert_eq!(report.outcome, UpsertOutcome::Updated);
    assert_eq!(report.user_id.as_deref(), Some("u-2"));

    let store = ctx.read_store();
    assert_eq!(store["version"], 3);

    let users = ctx.users();
    assert_eq!(users.len(), 2);
    assert_eq!(
        users[0],
        json!({"id": "u-1", "username": "alice", "role": "user", "quota": 10, "theme": "dark"})
    );

    let admin = &users[1];
    assert_eq!(admin["id"], "u-2");
    assert_eq!(admin["role"], "admin");
    assert_eq!(admin["quota"], 5);
    assert_eq!(admin["unlocked"], json!(["a"]));
    assert_eq!(admin["contentTokens"], json!([]));
    assert_eq!(admin["createdAt"], "2020-01-01T00:00:00.000Z");
    assert_eq!(admin["disabled"], false);
    assert_eq!(admin["accessUntilMs"], Value::Null);
    assert_eq!(admin["theme"], "light");
}

#[tokio::test]
async fn test_invalid_email_aborts_without_touching_store() {
    let ctx = TestContext::new(&[
        ("ADMIN_USER", "root-ops"),
        ("ADMIN_PASS", "correcthorse1"),
        ("ADMIN_EMAIL", "not-an-email"),
    ]);
    let original = "{\"users\": []}\n";
    ctx.write_store(original);

    let err = ctx.run().await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::InvalidField {
            field: "ADMIN_EMAIL",
            ..
        }
    ));
    assert!(err.is_usage_error());
    assert_eq!(ctx.read_store_raw(), original);
}

#[tokio::test]
async fn test_missing_password_aborts_before_creating_anything() {
    let ctx = TestContext::new(&[("ADMIN_USER", "root-ops")]);

    let err = ctx.run().await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::MissingField {
            field: "ADMIN_PASS"
        }
    ));
    assert!(!ctx.config.data_dir.exists());
}

#[tokio::test]
async fn test_unreadable_store_path_is_fatal() {
    let ctx = TestContext::admin();
    // A directory where the store file should be cannot be read as a file.
    std::fs::create_dir_all(ctx.users_path()).unwrap();

    let err = ctx.run().await.unwrap_err();
    assert!(matches!(err, BootstrapError::Io { .. }));
    assert!(!err.is_usage_error());
    assert!(ctx.users_path().is_dir());
}

#[tokio::test]
async fn test_report_names_user_path_and_restart() {
    let ctx = TestContext::admin();

    let report = ctx.run().await.unwrap();
    assert_eq!(report.path, std::path::absolute(ctx.users_path()).unwrap());

    let created = report.to_string();
    assert!(created.contains("Admin user 'root-ops' created."));
    assert!(created.contains(&format!("file: {}", report.path.display())));
    assert!(created.contains("Restart the server"));
    let id = ctx.users()[0]["id"].as_str().unwrap().to_string();
    assert!(created.contains(&id));

    let updated = ctx.run().await.unwrap().to_string();
    assert!(updated.contains("Admin user 'root-ops' updated."));
    assert!(updated.contains("Restart the server"));
}

#[tokio::test]
async fn test_report_id_for_record_with_fractional_quota() {
    let ctx = TestContext::admin();
    ctx.write_store(r#"{"users": [{"id": "u-3", "username": "root-ops", "quota": 2.5}]}"#);

    let report = ctx.run().await.unwrap();
    assert_eq!(report.user_id.as_deref(), Some("u-3"));
    assert_eq!(ctx.users()[0]["quota"], 2.5);
}
