//! Time bounds of a sale.
//!
//! Openness is never stored: [`MintWindow::status`] derives it from the
//! bounds and the call's timestamp every time.

use serde::{Deserialize, Serialize};

use super::WindowClosed;
use crate::chain::Timestamp;

/// Phase of a sale at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    NotStarted,
    Open,
    Ended,
}

/// Start and optional end of the period in which minting is permitted.
///
/// Without an end the window stays open forever once started. With an end
/// the window is the half-open range `[start, end)`. An end at or before the
/// start is accepted and simply yields a window that never opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintWindow {
    start: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<Timestamp>,
}

impl MintWindow {
    /// A window that opens at `start` and never closes.
    pub fn starting_at(start: Timestamp) -> Self {
        Self { start, end: None }
    }

    /// A window open during `[start, end)`.
    pub fn between(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn status(&self, now: Timestamp) -> WindowStatus {
        if now < self.start {
            return WindowStatus::NotStarted;
        }
        match self.end {
            Some(end) if now >= end => WindowStatus::Ended,
            _ => WindowStatus::Open,
        }
    }

    pub fn is_open(&self, now: Timestamp) -> bool {
        self.status(now) == WindowStatus::Open
    }

    /// Fails with the reason the window is closed at `now`.
    pub fn ensure_open(&self, now: Timestamp) -> Result<(), WindowClosed> {
        match self.status(now) {
            WindowStatus::Open => Ok(()),
            WindowStatus::NotStarted => Err(WindowClosed::NotStarted),
            WindowStatus::Ended => Err(WindowClosed::Finished),
        }
    }

    pub(crate) fn set_start(&mut self, start: Timestamp) {
        self.start = start;
    }

    pub(crate) fn set_end(&mut self, end: Timestamp) {
        self.end = Some(end);
    }
}
