// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{parse_expiry, AppTokenMinter};
use crate::credential::ProviderCredentials;
use crate::error::ApiError;

fn creds(signing_key: &str) -> ProviderCredentials {
    ProviderCredentials {
        signing_key: signing_key.to_owned(),
        app_id: "12345".to_owned(),
        installation_id: "67890".to_owned(),
        owner: "acme".to_owned(),
        repo: "widgets".to_owned(),
    }
}

#[test]
fn parse_expiry_accepts_rfc3339() {
    assert_eq!(parse_expiry("2026-01-01T00:00:00Z"), Some(1767225600));
    // Offsets normalize to the same instant.
    assert_eq!(parse_expiry("2026-01-01T01:00:00+01:00"), Some(1767225600));
}

#[test]
fn parse_expiry_rejects_garbage() {
    assert_eq!(parse_expiry("not a timestamp"), None);
    assert_eq!(parse_expiry(""), None);
}

#[test]
fn assertion_rejects_malformed_key() {
    let minter = AppTokenMinter::new(
        reqwest::Client::new(),
        "http://unused.invalid".to_owned(),
        &creds("not a pem"),
    );
    let err = minter.app_assertion().expect_err("should fail");
    assert!(matches!(err, ApiError::Credential(_)));
}
