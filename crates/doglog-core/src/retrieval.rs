// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The fetch, normalize, render and print loop.
//!
//! One cycle walks every page of the current search window, threading the
//! cursor returned by each page into the next call. One-shot mode runs a
//! single cycle; tail mode repeats cycles with an adaptive wait in between.

use std::io::{self, Write};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::FetchError;
use crate::normalize::Normalizer;
use crate::poll::{Clock, PollState};
use crate::search::{LogSearch, RawRecord, SearchRequest};
use crate::template::{print_rendered, FormatProfile, TemplateSet};

/// Display-only activity indicator, paused while a page is fetched and printed.
pub trait Progress: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn pause(&self) {}
    fn resume(&self) {}
    fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Fetching,
    Draining,
    Waiting,
    Done,
}

/// Result of one fetch-drain cycle.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Records printed during the cycle, across all pages.
    pub records: usize,
    /// The fetch error that cut the cycle short, if any.
    pub error: Option<FetchError>,
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the cycle counts as having found records for backoff purposes.
    pub fn found(&self) -> bool {
        self.is_success() && self.records > 0
    }
}

pub struct RetrievalLoop<S, C, W> {
    search: S,
    clock: C,
    out: W,
    request: SearchRequest,
    normalizer: Normalizer,
    templates: TemplateSet,
    profile: FormatProfile,
    json: bool,
    poll: PollState,
    progress: Arc<dyn Progress>,
    state: LoopState,
}

impl<S, C, W> RetrievalLoop<S, C, W>
where
    S: LogSearch,
    C: Clock,
    W: Write + Send,
{
    pub fn new(
        search: S,
        clock: C,
        out: W,
        request: SearchRequest,
        normalizer: Normalizer,
        templates: TemplateSet,
    ) -> Self {
        RetrievalLoop {
            search,
            clock,
            out,
            request,
            normalizer,
            templates,
            profile: FormatProfile::default(),
            json: false,
            poll: PollState::default(),
            progress: Arc::new(NoProgress),
            state: LoopState::Idle,
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: FormatProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Prints the JSON view of each record instead of rendering templates.
    #[must_use]
    pub fn with_json_output(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[must_use]
    pub fn with_poll_state(mut self, poll: PollState) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Fetches and prints every page of the current window.
    ///
    /// A fetch error ends the cycle without attempting the remaining pages and
    /// is returned in the outcome. Only output failures are returned as `Err`.
    pub async fn run_cycle(&mut self) -> io::Result<CycleOutcome> {
        let mut outcome = CycleOutcome::default();
        let mut cursor = None;

        loop {
            self.state = LoopState::Fetching;
            let request = self.request.with_cursor(cursor.take());
            self.progress.pause();
            let page = match self.search.submit(&request).await {
                Ok(page) => page,
                Err(e) => {
                    self.progress.resume();
                    error!("Error when searching logs: {e}");
                    outcome.error = Some(e);
                    break;
                }
            };

            self.state = LoopState::Draining;
            let drained = self.drain(&page.records);
            self.progress.resume();
            outcome.records += drained?;

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        self.state = LoopState::Idle;
        debug!(
            "Cycle complete: {} record(s), success: {}",
            outcome.records,
            outcome.is_success()
        );
        Ok(outcome)
    }

    /// Runs a single cycle and reports whether it succeeded.
    pub async fn run_once(&mut self) -> io::Result<bool> {
        let outcome = self.run_cycle().await;
        self.state = LoopState::Done;
        Ok(outcome?.is_success())
    }

    /// Repeats cycles until `cancel` fires, waiting between them per [`PollState`].
    ///
    /// Cancellation is observed between cycles and while waiting.
    pub async fn tail(&mut self, cancel: CancellationToken) -> io::Result<()> {
        let result = self.tail_until_cancelled(&cancel).await;
        self.state = LoopState::Done;
        self.progress.stop();
        result
    }

    async fn tail_until_cancelled(&mut self, cancel: &CancellationToken) -> io::Result<()> {
        while !cancel.is_cancelled() {
            let outcome = self.run_cycle().await?;
            let delay = self.poll.register(outcome.found());
            debug!("Waiting {delay:?} before the next search");

            self.state = LoopState::Waiting;
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.clock.sleep(delay) => {}
            }
        }
        Ok(())
    }

    fn drain(&mut self, records: &[RawRecord]) -> io::Result<usize> {
        for record in records {
            self.emit(record)?;
        }
        self.out.flush()?;
        Ok(records.len())
    }

    fn emit(&mut self, record: &RawRecord) -> io::Result<()> {
        let normalized = self.normalizer.normalize(record);
        if self.json {
            return writeln!(self.out, "{}", normalized.json());
        }
        let rendered = self
            .templates
            .profile(self.profile)
            .render(normalized.fields());
        print_rendered(&mut self.out, &rendered.text)
    }
}
