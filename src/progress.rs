// src/progress.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Progress reporting for batch runs.
//!
//! The batch executor only knows the [`ProgressSink`] trait; rendering is an
//! injectable capability. [`ConsoleProgress`] draws an indicatif bar,
//! [`FnProgress`] forwards to a closure.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Receives `(completed, total)` after every finished unit.
pub trait ProgressSink: Send + Sync {
    fn update(&self, completed: u64, total: u64);

    /// Called once after the last unit; default does nothing.
    fn finish(&self, _completed: u64, _total: u64) {}
}

/// Completed-unit counter owned by a single batch run.
///
/// The count is bumped and reported under one lock, so a sink sees
/// 1, 2, .., N in order no matter which worker finishes first.
pub struct ProgressCounter {
    completed: Mutex<u64>,
    total: u64,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressCounter {
    pub fn new(total: u64, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            completed: Mutex::new(0),
            total,
            sink,
        }
    }

    /// Count one finished unit and report it. Returns the new completed count.
    pub fn advance(&self) -> u64 {
        let mut completed = self.lock();
        *completed += 1;
        if let Some(sink) = &self.sink {
            sink.update(*completed, self.total);
        }
        *completed
    }

    pub fn completed(&self) -> u64 {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.completed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn finish(&self) {
        if let Some(sink) = &self.sink {
            sink.finish(self.completed(), self.total);
        }
    }
}

/// Closure-backed sink.
pub struct FnProgress<F> {
    callback: F,
}

impl<F> FnProgress<F>
where
    F: Fn(u64, u64) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressSink for FnProgress<F>
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn update(&self, completed: u64, total: u64) {
        (self.callback)(completed, total)
    }
}

/// Console progress bar for batch operations
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    /// Create a bar labelled with `operation` (e.g. "Uploading").
    pub fn new(operation: &str) -> Self {
        let bar = ProgressBar::new(0);
        let template = format!(
            "{}: {{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} objects ({{per_sec}}, ETA: {{eta}})",
            operation
        );
        // A bad template only loses the styling, never the counts.
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, completed: u64, total: u64) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(completed);
    }

    fn finish(&self, completed: u64, total: u64) {
        self.bar.finish_with_message(format!("{completed}/{total} objects"));
    }
}
