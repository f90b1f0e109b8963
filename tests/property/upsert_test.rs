// tests/property/upsert_test.rs

//! Property-based tests for the admin upsert

use admin_bootstrap::core::credential::Credential;
use admin_bootstrap::core::store::UsersFile;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_repeated_upserts_keep_one_record_per_username(
        runs in prop::collection::vec(
            prop::sample::select(vec!["root-ops", "alice", "bob.admin", "ops_2"]),
            1..=30
        )
    ) {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut users = UsersFile::default();
        let mut first_seen = std::collections::HashMap::new();

        for (i, username) in runs.iter().enumerate() {
            let now = start + Duration::seconds(i as i64);
            let credential = Credential {
                salt: format!("{i:032x}"),
                pass_hash: format!("{i:0128x}"),
            };
            users.upsert_admin(username, &credential, None, now);
            first_seen
                .entry(*username)
                .or_insert_with(|| now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true));

            let record = users.find(username).unwrap();
            prop_assert_eq!(&record.salt, &credential.salt);
            prop_assert_eq!(&record.created_at, &first_seen[username]);
            prop_assert_eq!(record.role.as_str(), "admin");
        }

        prop_assert_eq!(users.users.len(), first_seen.len());
        for username in first_seen.keys() {
            prop_assert_eq!(users.count(username), 1);
        }
    }
}
