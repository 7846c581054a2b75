// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How a service filter and a free-text query are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryJoin {
    /// `service:web AND status:error`
    #[default]
    And,
    /// `service:web status:error`
    Space,
}

impl QueryJoin {
    fn separator(self) -> &'static str {
        match self {
            QueryJoin::And => " AND ",
            QueryJoin::Space => " ",
        }
    }
}

impl FromStr for QueryJoin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(QueryJoin::And),
            "space" => Ok(QueryJoin::Space),
            other => Err(ConfigError::Invalid(format!(
                "unknown query join '{other}', expected 'and' or 'space'"
            ))),
        }
    }
}

impl fmt::Display for QueryJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryJoin::And => f.write_str("and"),
            QueryJoin::Space => f.write_str("space"),
        }
    }
}

/// Builds the search query sent to the logs API.
///
/// A match-all query (`*`) adds nothing once a service filter is present.
pub fn build_query(service: Option<&str>, query: &str, join: QueryJoin) -> String {
    let query = query.trim();
    match service.map(str::trim).filter(|s| !s.is_empty()) {
        Some(service) if query.is_empty() || query == "*" => format!("service:{service}"),
        Some(service) => format!("service:{service}{}{query}", join.separator()),
        None if query.is_empty() => "*".to_string(),
        None => query.to_string(),
    }
}
