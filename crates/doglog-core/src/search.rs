// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The remote log search collaborator and the records it returns.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::FetchError;
use crate::value::AttributeValue;

/// One log record as delivered by the logs API, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub status: Option<String>,
    pub service: Option<String>,
    pub host: Option<String>,
    pub timestamp: Option<String>,
    pub message: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Parameters of a single search call. Query and time bounds are passed
/// through to the API verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub from: String,
    pub to: String,
    pub indexes: Vec<String>,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl SearchRequest {
    /// The same logical query continued at `cursor`.
    #[must_use]
    pub fn with_cursor(&self, cursor: Option<String>) -> Self {
        SearchRequest {
            cursor,
            ..self.clone()
        }
    }
}

/// One page of results. `next_cursor` is absent on the last page of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<RawRecord>,
    pub next_cursor: Option<String>,
}

/// Anything able to answer a paginated log search, sorted by ascending timestamp.
#[async_trait]
pub trait LogSearch: Send + Sync {
    async fn submit(&self, request: &SearchRequest) -> Result<SearchPage, FetchError>;
}
