// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Terminal activity indicator shown on stderr while tailing.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use doglog_core::Progress;
use tokio_util::sync::CancellationToken;

const FRAMES: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_LINE: &str = "\r\x1b[K";

#[derive(Debug, Default)]
struct State {
    paused: bool,
    visible: bool,
    stopped: bool,
}

/// Braille spinner drawn by a background task until stopped.
#[derive(Debug)]
pub struct Spinner<W = io::Stderr> {
    state: Mutex<State>,
    out: Mutex<W>,
    cancel: CancellationToken,
}

impl Spinner {
    /// Starts drawing on stderr. Must be called from within a tokio runtime.
    pub fn start() -> Arc<Self> {
        let spinner = Arc::new(Spinner::new(io::stderr()));
        spinner.write(HIDE_CURSOR);
        tokio::spawn(spinner.clone().run());
        spinner
    }
}

impl<W: Write + Send + 'static> Spinner<W> {
    fn new(out: W) -> Self {
        Spinner {
            state: Mutex::new(State::default()),
            out: Mutex::new(out),
            cancel: CancellationToken::new(),
        }
    }

    async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(FRAME_INTERVAL);
        for frame in FRAMES.iter().cycle() {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = interval.tick() => self.draw(*frame),
            }
        }
    }

    fn draw(&self, frame: char) {
        let mut state = self.lock_state();
        if state.paused || state.stopped {
            return;
        }
        self.write(&format!("\r\x1b[1;31m{frame}\x1b[0m "));
        state.visible = true;
    }

    fn clear(&self, state: &mut State) {
        if state.visible {
            self.write(CLEAR_LINE);
            state.visible = false;
        }
    }

    // Drawing is best effort; a closed stderr must not end the run.
    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send + 'static> Progress for Spinner<W> {
    fn pause(&self) {
        let mut state = self.lock_state();
        state.paused = true;
        self.clear(&mut state);
    }

    fn resume(&self) {
        self.lock_state().paused = false;
    }

    fn stop(&self) {
        let mut state = self.lock_state();
        if state.stopped {
            return;
        }
        state.stopped = true;
        self.clear(&mut state);
        self.write(SHOW_CURSOR);
        self.cancel.cancel();
    }
}
