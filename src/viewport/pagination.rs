// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Incremental extension of the viewport as the user scrolls towards its trailing edge.
//!
//! One pass is `Idle -> FetchPending -> Appending -> Idle`: when the scroll position is within
//! the trailing threshold, the scroll channel is detached, the engine cursor moves to the
//! address of the last line, one bounded batch is requested and everything after its first
//! line (a repeat of the last visible line) is appended. Passes repeat up to a fixed cap per
//! call so a boundary that keeps producing tiny batches cannot spin forever.

use memchr::memchr;

use crate::engine::{AnalysisEngine, EngineError};

use super::buffer::Viewport;
use super::guard::{Channel, NotificationChannels};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationState {
    #[default]
    Idle,
    FetchPending,
    Appending,
}

/// Result of a single pagination pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    NotNearEnd,
    Appended { lines: usize },
    /// The last line has no address to continue from.
    InvalidBoundary,
    /// The batch had nothing new after its first line.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NotNearEnd,
    InvalidBoundary,
    Exhausted,
    PassCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationReport {
    pub passes: usize,
    pub fetches: usize,
    pub lines_appended: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone)]
pub struct PaginationController {
    state: PaginationState,
    batch_size: usize,
    pass_cap: usize,
    threshold_fraction: f64,
    last_remainder: Option<String>,
    total_fetches: u64,
}

impl PaginationController {
    pub fn new(batch_size: usize, pass_cap: usize, threshold_fraction: f64) -> Self {
        Self {
            state: PaginationState::Idle,
            batch_size: batch_size.max(2),
            pass_cap: pass_cap.max(1),
            threshold_fraction,
            last_remainder: None,
            total_fetches: 0,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pass_cap(&self) -> usize {
        self.pass_cap
    }

    pub fn total_fetches(&self) -> u64 {
        self.total_fetches
    }

    /// Forgets the last appended remainder; called whenever the viewport is replaced.
    pub fn reset(&mut self) {
        self.state = PaginationState::Idle;
        self.last_remainder = None;
    }

    /// Trailing threshold in lines for a viewport of `height` lines, never below one.
    pub fn threshold_lines(&self, height: usize) -> usize {
        let lines = (height as f64 * self.threshold_fraction).ceil();
        if lines.is_finite() && lines >= 1.0 {
            lines as usize
        } else {
            1
        }
    }

    /// Content shorter than the viewport always counts as near the end.
    pub fn is_near_end(&self, viewport: &Viewport) -> bool {
        let threshold = self.threshold_lines(viewport.height()) as i64;
        viewport.scroll_top() as i64 > viewport.max_scroll() as i64 - threshold
    }

    /// Runs passes until one does not append or the pass cap is reached.
    pub fn paginate<E>(
        &mut self,
        engine: &mut E,
        viewport: &mut Viewport,
        channels: &NotificationChannels,
    ) -> Result<PaginationReport, EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        let mut report = PaginationReport {
            passes: 0,
            fetches: 0,
            lines_appended: 0,
            stop: StopReason::PassCap,
        };

        while report.passes < self.pass_cap {
            report.passes += 1;
            let outcome = self.run_pass(engine, viewport, channels)?;
            if !matches!(outcome, PassOutcome::NotNearEnd | PassOutcome::InvalidBoundary) {
                report.fetches += 1;
            }
            match outcome {
                PassOutcome::Appended { lines } => report.lines_appended += lines,
                PassOutcome::NotNearEnd => {
                    report.stop = StopReason::NotNearEnd;
                    break;
                }
                PassOutcome::InvalidBoundary => {
                    report.stop = StopReason::InvalidBoundary;
                    break;
                }
                PassOutcome::Exhausted => {
                    report.stop = StopReason::Exhausted;
                    break;
                }
            }
        }

        log::debug!(
            "pagination: {} passes, {} fetches, {} lines, stop={:?}",
            report.passes,
            report.fetches,
            report.lines_appended,
            report.stop
        );
        Ok(report)
    }

    /// One pass of the state machine. The controller is `Idle` again on every return,
    /// including engine failures.
    pub fn run_pass<E>(
        &mut self,
        engine: &mut E,
        viewport: &mut Viewport,
        channels: &NotificationChannels,
    ) -> Result<PassOutcome, EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        if !self.is_near_end(viewport) {
            return Ok(PassOutcome::NotNearEnd);
        }
        let outcome = self.fetch_and_append(engine, viewport, channels);
        self.state = PaginationState::Idle;
        outcome
    }

    fn fetch_and_append<E>(
        &mut self,
        engine: &mut E,
        viewport: &mut Viewport,
        channels: &NotificationChannels,
    ) -> Result<PassOutcome, EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        self.state = PaginationState::FetchPending;
        let _scroll = channels.suppress(&[Channel::Scroll]);

        let Some(boundary) = viewport.last_line_address() else {
            log::debug!("pagination: last line has no address");
            return Ok(PassOutcome::InvalidBoundary);
        };

        engine.reposition_cursor(boundary)?;
        let batch = engine.disassemble_batch(self.batch_size)?;
        self.total_fetches += 1;

        let remainder = strip_first_line(&batch);
        if remainder.trim().is_empty() || self.last_remainder.as_deref() == Some(remainder) {
            log::debug!("pagination: exhausted at {boundary}");
            return Ok(PassOutcome::Exhausted);
        }

        self.state = PaginationState::Appending;
        let lines = viewport.append(remainder.lines());
        self.last_remainder = Some(remainder.to_owned());
        Ok(PassOutcome::Appended { lines })
    }
}

/// Everything after the first line break; empty when there is no second line.
pub(crate) fn strip_first_line(batch: &str) -> &str {
    match memchr(b'\n', batch.as_bytes()) {
        Some(pos) => &batch[pos + 1..],
        None => "",
    }
}
