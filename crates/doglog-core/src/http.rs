// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the Datadog Logs Search API (`/api/v2/logs/events/search`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, FetchError};
use crate::search::{LogSearch, RawRecord, SearchPage, SearchRequest};

const SEARCH_ENDPOINT: &str = "/api/v2/logs/events/search";
pub const DEFAULT_SITE: &str = "datadoghq.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Results are requested in ascending timestamp order so tailing never skips records.
const SORT_ASCENDING: &str = "timestamp";
const TIMEZONE: &str = "GMT";

/// Credentials attached to every search call.
#[derive(Clone)]
pub struct Auth {
    pub api_key: String,
    pub application_key: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("api_key", &"<redacted>")
            .field("application_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub auth: Auth,
    pub site: String,
    /// Full base URL; takes precedence over `site` when set.
    pub url: Option<String>,
    pub timeout: Duration,
    pub https_proxy: Option<String>,
}

impl ClientConfig {
    pub fn new(auth: Auth) -> Self {
        ClientConfig {
            auth,
            site: DEFAULT_SITE.to_string(),
            url: None,
            timeout: DEFAULT_TIMEOUT,
            https_proxy: None,
        }
    }

    /// Scheme and host the search endpoint is appended to.
    pub fn base_url(&self) -> String {
        match self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let site = self.site.trim();
                let site = if site.is_empty() { DEFAULT_SITE } else { site };
                format!("https://api.{site}")
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    filter: Filter<'a>,
    options: Options,
    page: Page<'a>,
    sort: &'static str,
}

#[derive(Debug, Serialize)]
struct Filter<'a> {
    query: &'a str,
    from: &'a str,
    to: &'a str,
    indexes: &'a [String],
}

#[derive(Debug, Serialize)]
struct Options {
    timezone: &'static str,
}

#[derive(Debug, Serialize)]
struct Page<'a> {
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

impl<'a> From<&'a SearchRequest> for SearchBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        SearchBody {
            filter: Filter {
                query: &request.query,
                from: &request.from,
                to: &request.to,
                indexes: &request.indexes,
            },
            options: Options { timezone: TIMEZONE },
            page: Page {
                limit: request.limit,
                cursor: request.cursor.as_deref(),
            },
            sort: SORT_ASCENDING,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    data: Vec<LogEntry>,
    meta: Option<ResponseMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogEntry {
    id: Option<String>,
    attributes: RawRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseMeta {
    page: Option<ResponsePage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePage {
    after: Option<String>,
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        let next_cursor = response
            .meta
            .and_then(|meta| meta.page)
            .and_then(|page| page.after)
            .filter(|after| !after.is_empty());
        let records = response
            .data
            .into_iter()
            .map(|entry| RawRecord {
                id: entry.id,
                ..entry.attributes
            })
            .collect();
        SearchPage {
            records,
            next_cursor,
        }
    }
}

/// [`LogSearch`] backed by the Datadog Logs API.
#[derive(Debug, Clone)]
pub struct DatadogLogsClient {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl DatadogLogsClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("doglog/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "DD-API-KEY",
            HeaderValue::from_str(&config.auth.api_key)
                .map_err(|_| ConfigError::Invalid("API key is not a valid header value".into()))?,
        );
        headers.insert(
            "DD-APPLICATION-KEY",
            HeaderValue::from_str(&config.auth.application_key).map_err(|_| {
                ConfigError::Invalid("application key is not a valid header value".into())
            })?,
        );

        let client = build_client(config.https_proxy.as_deref(), config.timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(DatadogLogsClient {
            client,
            url: format!("{}{SEARCH_ENDPOINT}", config.base_url()),
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogSearch for DatadogLogsClient {
    async fn submit(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        let body = SearchBody::from(request);
        debug!(
            url = %self.url,
            headers = ?redact_headers(&self.headers),
            query = %request.query,
            from = %request.from,
            to = %request.to,
            cursor = ?request.cursor,
            "Sending logs search request"
        );

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            debug!(status = %status, body = %text, "Logs search failed");
            return Err(FetchError::from_status(status, text));
        }

        let page = SearchPage::from(serde_json::from_slice::<SearchResponse>(&bytes)?);
        debug!(
            status = %status,
            records = page.records.len(),
            next_cursor = ?page.next_cursor,
            "Logs search response"
        );
        Ok(page)
    }
}

/// Builds a reqwest client with optional proxy configuration and timeout.
fn build_client(proxy_url: Option<&str>, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().use_rustls_tls().timeout(timeout);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    builder.build()
}

/// Returns a redacted view of request headers suitable for debug logging.
fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    const SENSITIVE_HEADERS: [&str; 3] = ["dd-api-key", "dd-application-key", "authorization"];

    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.as_str().to_ascii_lowercase();
            let display = if SENSITIVE_HEADERS.contains(&lower.as_str()) {
                "<redacted>".to_string()
            } else {
                value
                    .to_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| "<non-utf8>".to_string())
            };
            (lower, display)
        })
        .collect()
}
