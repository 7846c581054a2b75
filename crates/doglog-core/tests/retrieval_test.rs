// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use doglog_core::poll::{Clock, PollState, MIN_DELAY};
use doglog_core::{
    FetchError, FieldMap, FormatProfile, LogSearch, LoopState, Normalizer, RawRecord,
    RetrievalLoop, SearchPage, SearchRequest, TemplateRenderer, TemplateSet,
};
use tokio_util::sync::CancellationToken;

/// Plays back canned pages and records every request it receives.
#[derive(Clone, Default)]
struct ScriptedSearch {
    responses: Arc<Mutex<VecDeque<Result<SearchPage, FetchError>>>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
}

impl ScriptedSearch {
    fn new(responses: Vec<Result<SearchPage, FetchError>>) -> Self {
        ScriptedSearch {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    fn cursors(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.cursor.clone())
            .collect()
    }
}

#[async_trait]
impl LogSearch for ScriptedSearch {
    async fn submit(&self, request: &SearchRequest) -> Result<SearchPage, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SearchPage::default()))
    }
}

/// Records requested waits and cancels the run after `limit` of them.
#[derive(Clone)]
struct RecordingClock {
    waits: Arc<Mutex<Vec<Duration>>>,
    limit: usize,
    cancel: CancellationToken,
}

impl RecordingClock {
    fn new(limit: usize, cancel: CancellationToken) -> Self {
        RecordingClock {
            waits: Arc::default(),
            limit,
            cancel,
        }
    }

    fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        let mut waits = self.waits.lock().unwrap();
        waits.push(duration);
        if waits.len() >= self.limit {
            self.cancel.cancel();
        }
    }
}

fn record(message: &str) -> RawRecord {
    RawRecord {
        status: Some("info".to_string()),
        service: Some("web".to_string()),
        message: Some(message.to_string()),
        ..Default::default()
    }
}

fn page(messages: &[&str], next_cursor: Option<&str>) -> Result<SearchPage, FetchError> {
    Ok(SearchPage {
        records: messages.iter().map(|m| record(m)).collect(),
        next_cursor: next_cursor.map(str::to_string),
    })
}

fn request() -> SearchRequest {
    SearchRequest {
        query: "service:web".to_string(),
        from: "now-15m".to_string(),
        to: "now".to_string(),
        indexes: vec!["main".to_string()],
        limit: 2,
        cursor: None,
    }
}

fn templates() -> TemplateSet {
    TemplateSet::new(
        TemplateRenderer::new([("short", "{{.__Service}} {{.__level}} {{.__message}}")]).unwrap(),
        TemplateRenderer::new([("long", "{{.__Service}} [{{.__level}}] {{.__message}}")]).unwrap(),
    )
}

fn retrieval<C: Clock>(
    search: ScriptedSearch,
    clock: C,
) -> RetrievalLoop<ScriptedSearch, C, Vec<u8>> {
    RetrievalLoop::new(
        search,
        clock,
        Vec::new(),
        request(),
        Normalizer::new(FieldMap::default(), false, false),
        templates(),
    )
}

fn lines(output: Vec<u8>) -> Vec<String> {
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_pages_are_threaded_by_cursor() {
    let search = ScriptedSearch::new(vec![page(&["one", "two"], Some("X")), page(&["three"], None)]);
    let clock = RecordingClock::new(1, CancellationToken::new());
    let mut retrieval = retrieval(search.clone(), clock.clone());

    assert!(retrieval.run_once().await.unwrap());
    assert_eq!(retrieval.state(), LoopState::Done);
    assert_eq!(search.cursors(), vec![None, Some("X".to_string())]);
    assert!(clock.waits().is_empty());
    assert_eq!(
        lines(retrieval.into_output()),
        vec!["web INFO one", "web INFO two", "web INFO three"]
    );

    // the continuation carries the same logical query
    let requests = search.requests.lock().unwrap();
    assert_eq!(requests[1], request().with_cursor(Some("X".to_string())));
}

#[tokio::test]
async fn test_long_profile_uses_long_templates() {
    let search = ScriptedSearch::new(vec![page(&["one"], None)]);
    let mut retrieval = retrieval(search, RecordingClock::new(1, CancellationToken::new()))
        .with_profile(FormatProfile::Long);
    assert!(retrieval.run_once().await.unwrap());
    assert_eq!(lines(retrieval.into_output()), vec!["web [INFO] one"]);
}

#[tokio::test]
async fn test_run_once_reports_fetch_failure() {
    let search = ScriptedSearch::new(vec![
        page(&["one"], Some("X")),
        Err(FetchError::Server(502, "bad gateway".to_string())),
        page(&["never"], None),
    ]);
    let mut retrieval = retrieval(search.clone(), RecordingClock::new(1, CancellationToken::new()));

    assert!(!retrieval.run_once().await.unwrap());
    assert_eq!(search.cursors().len(), 2);
    assert_eq!(lines(retrieval.into_output()), vec!["web INFO one"]);
}

#[tokio::test]
async fn test_run_cycle_counts_records_across_pages() {
    let search = ScriptedSearch::new(vec![page(&["a", "b"], Some("X")), page(&["c"], None)]);
    let mut retrieval = retrieval(search, RecordingClock::new(1, CancellationToken::new()));
    let outcome = retrieval.run_cycle().await.unwrap();
    assert_eq!(outcome.records, 3);
    assert!(outcome.is_success());
    assert!(outcome.found());
    assert_eq!(retrieval.state(), LoopState::Idle);
}

#[tokio::test]
async fn test_tail_backs_off_while_nothing_is_found() {
    let search = ScriptedSearch::new(vec![
        page(&[], None),
        page(&[], None),
        page(&[], None),
        page(&["arrived"], None),
        page(&[], None),
    ]);
    let cancel = CancellationToken::new();
    let clock = RecordingClock::new(5, cancel.clone());
    let mut retrieval = retrieval(search.clone(), clock.clone());

    retrieval.tail(cancel).await.unwrap();

    assert_eq!(
        clock.waits(),
        vec![
            MIN_DELAY,
            MIN_DELAY * 2,
            MIN_DELAY * 4,
            MIN_DELAY,
            MIN_DELAY,
        ]
    );
    assert_eq!(search.cursors(), vec![None; 5]);
    assert_eq!(retrieval.state(), LoopState::Done);
    assert_eq!(retrieval.poll_state().delay(), MIN_DELAY * 2);
    assert_eq!(lines(retrieval.into_output()), vec!["web INFO arrived"]);
}

#[tokio::test]
async fn test_tail_delay_is_capped() {
    let cancel = CancellationToken::new();
    let clock = RecordingClock::new(6, cancel.clone());
    let mut retrieval = retrieval(ScriptedSearch::default(), clock.clone());

    retrieval.tail(cancel).await.unwrap();

    let secs: Vec<u64> = clock.waits().iter().map(Duration::as_secs).collect();
    assert_eq!(secs, vec![5, 10, 20, 30, 30, 30]);
}

#[tokio::test]
async fn test_tail_treats_fetch_error_as_empty_cycle() {
    let search = ScriptedSearch::new(vec![
        page(&["first"], Some("X")),
        Err(FetchError::RateLimited),
        page(&["second"], None),
    ]);
    let cancel = CancellationToken::new();
    let clock = RecordingClock::new(2, cancel.clone());
    let mut retrieval = retrieval(search.clone(), clock.clone())
        .with_poll_state(PollState::new(Duration::from_secs(1), Duration::from_secs(8)));

    retrieval.tail(cancel).await.unwrap();

    // the failed cycle skips its remaining pages and the next one starts over
    assert_eq!(
        search.cursors(),
        vec![None, Some("X".to_string()), None]
    );
    assert_eq!(
        clock.waits(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );
    assert_eq!(
        lines(retrieval.into_output()),
        vec!["web INFO first", "web INFO second"]
    );
}
