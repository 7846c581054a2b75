// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors detected while loading credentials, field mappings or templates.
///
/// All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Field mapping '{0}' has no candidate keys")]
    EmptyFieldMapping(String),

    #[error("Template '{name}' is invalid: {reason}")]
    Template { name: String, reason: String },

    #[error("Unable to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors raised by a single call to the logs search API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Credentials were rejected.
    #[error("unauthorized - check the API and application keys (status {0})")]
    Unauthorized(u16),

    #[error("rate limited by the logs API (status 429)")]
    RateLimited,

    /// Any other 4xx answer, usually a malformed query or time range.
    #[error("request rejected with status {0}: {1}")]
    Request(u16, String),

    #[error("logs API error with status {0}: {1}")]
    Server(u16, String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Maps a non-success HTTP status and its body to an error.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => FetchError::Unauthorized(status.as_u16()),
            429 => FetchError::RateLimited,
            code if status.is_server_error() => FetchError::Server(code, body),
            code => FetchError::Request(code, body),
        }
    }
}

/// A template could not be rendered against a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("map has no entry for key \"{0}\"")]
    MissingField(String),
}
