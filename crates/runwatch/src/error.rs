// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure classes for credential and upstream provider operations.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Signing key malformed or the token exchange was rejected.
    Credential(String),
    /// Bearer token expired or rejected at call time.
    Auth(String),
    /// Upstream returned a non-auth error status.
    Provider { status: u16, message: String },
    /// Network-level failure before an HTTP status was produced.
    Transport(String),
}

impl ApiError {
    /// Auth-class failures are the only ones eligible for renew-and-retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Credential(_) => "CREDENTIAL",
            Self::Auth(_) => "AUTH",
            Self::Provider { .. } => "PROVIDER",
            Self::Transport(_) => "TRANSPORT",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Credential(_) => 503,
            Self::Auth(_) => 502,
            Self::Provider { .. } => 502,
            Self::Transport(_) => 502,
        }
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: ErrorBody { code: self.code().to_owned(), message: self.to_string() },
        };
        (status, Json(body))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential(msg) => write!(f, "credential error: {msg}"),
            Self::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Self::Provider { status, message } => {
                write!(f, "provider error ({status}): {message}")
            }
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Top-level HTTP error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
