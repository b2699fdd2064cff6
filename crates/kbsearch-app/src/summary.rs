// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{ANSWERS_FIELD, Row};
use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const MAX_ANSWER_CHARS: usize = 2000;
pub const STREAM_CURSOR: char = '_';
pub const CANCEL_RESET: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRequest {
    pub answers: Vec<String>,
    pub question: String,
}

impl SummaryRequest {
    pub fn from_rows(rows: &[&Row], question: &str) -> Self {
        Self {
            answers: rows
                .iter()
                .map(|row| truncate_chars(&row.text(ANSWERS_FIELD), MAX_ANSWER_CHARS).to_owned())
                .collect(),
            question: question.to_owned(),
        }
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Stop request shared between the UI and one streaming worker. Once made,
/// a stop is latched for the session (`stop_requested`). `is_cancelled` only
/// reports it for `reset_after`, then the token reads as ready again.
#[derive(Debug, Clone)]
pub struct CancelToken {
    requested_at: Arc<Mutex<Option<Instant>>>,
    reset_after: Duration,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::with_reset(CANCEL_RESET)
    }

    pub fn with_reset(reset_after: Duration) -> Self {
        Self {
            requested_at: Arc::new(Mutex::new(None)),
            reset_after,
        }
    }

    pub fn cancel(&self) {
        self.cancel_at(Instant::now());
    }

    pub fn cancel_at(&self, at: Instant) {
        *self.lock() = Some(at);
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled_at(Instant::now())
    }

    pub fn is_cancelled_at(&self, now: Instant) -> bool {
        let requested_at = *self.lock();
        requested_at.is_some_and(|at| now.saturating_duration_since(at) < self.reset_after)
    }

    /// True once `cancel` has been called on any clone, however long ago.
    pub fn stop_requested(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        match self.requested_at.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Incremental text producer behind a summary session.
pub trait ChunkSource {
    /// Next decoded piece of text, or `None` once the stream has ended.
    fn next_chunk(&mut self) -> Result<Option<String>>;
    fn abort(&mut self);
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        (**self).next_chunk()
    }

    fn abort(&mut self) {
        (**self).abort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryUpdate {
    /// Accumulated text plus the trailing cursor.
    Partial(String),
    Finished(String),
    Cancelled(String),
    Failed(String),
}

impl SummaryUpdate {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Partial(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Streaming,
    Finished,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySession {
    request: SummaryRequest,
    accumulated: String,
    state: SessionState,
}

impl SummarySession {
    pub fn new(request: SummaryRequest) -> Self {
        Self {
            request,
            accumulated: String::new(),
            state: SessionState::Streaming,
        }
    }

    pub fn request(&self) -> &SummaryRequest {
        &self.request
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Streaming
    }

    pub fn display_text(&self) -> String {
        if self.is_active() {
            let mut text = self.accumulated.clone();
            text.push(STREAM_CURSOR);
            text
        } else {
            self.accumulated.clone()
        }
    }

    /// Drains `source`, reporting every step through `on_update`. The stop
    /// token is checked before each read, so a read already waiting on the
    /// network finishes before the abort happens. A stop made during that
    /// read still ends the session, however long the read took.
    pub fn run<S: ChunkSource>(
        &mut self,
        source: &mut S,
        cancel: &CancelToken,
        mut on_update: impl FnMut(SummaryUpdate),
    ) {
        while self.is_active() {
            if cancel.stop_requested() {
                source.abort();
                self.state = SessionState::Cancelled;
                tracing::debug!(chars = self.accumulated.len(), "summary stream stopped");
                on_update(SummaryUpdate::Cancelled(self.accumulated.clone()));
                return;
            }

            match source.next_chunk() {
                Ok(Some(chunk)) => {
                    self.accumulated.push_str(&chunk);
                    on_update(SummaryUpdate::Partial(self.display_text()));
                }
                Ok(None) => {
                    self.state = SessionState::Finished;
                    on_update(SummaryUpdate::Finished(self.accumulated.clone()));
                }
                Err(error) => {
                    self.state = SessionState::Failed;
                    tracing::warn!(error = %format!("{error:#}"), "summary stream failed");
                    on_update(SummaryUpdate::Failed(format!("{error:#}")));
                }
            }
        }
    }
}
