// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared UI state for cross-component coordination.
//!
//! The viewport engine lives on the TUI thread. Programmatic integrations (MCP) never touch it
//! directly: they queue seek requests here and read the snapshot the TUI publishes after every
//! cycle that changed something.

use crate::engine::AnalysisEngine;
use crate::model::{Address, FunctionRecord};
use crate::viewport::{CursorPos, FocusState, Panels, ViewportEngine};

/// Plain copy of the observable viewport state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub anchor: Option<Address>,
    pub cursor: CursorPos,
    pub scroll_top: usize,
    pub height: usize,
    pub line_count: usize,
    pub visible_lines: Vec<String>,
    pub focus: FocusState,
    pub panels: Panels,
    /// Most recent first.
    pub history: Vec<Address>,
    pub functions: Vec<FunctionRecord>,
}

impl ViewSnapshot {
    pub fn capture<E: AnalysisEngine>(view: &ViewportEngine<E>) -> Self {
        let viewport = view.viewport();
        Self {
            anchor: viewport.anchor(),
            cursor: viewport.cursor(),
            scroll_top: viewport.scroll_top(),
            height: viewport.height(),
            line_count: viewport.line_count(),
            visible_lines: viewport.visible_lines().to_vec(),
            focus: view.focus_state().clone(),
            panels: view.panels().clone(),
            history: view.history().collect(),
            functions: view.engine().functions(),
        }
    }

    pub fn cursor_line(&self) -> Option<&str> {
        let offset = self.cursor.line.checked_sub(self.scroll_top)?;
        self.visible_lines.get(offset).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    rev: u64,
    pending_seek: Option<Address>,
    snapshot: Option<ViewSnapshot>,
}

impl UiState {
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn pending_seek(&self) -> Option<Address> {
        self.pending_seek
    }

    pub fn snapshot(&self) -> Option<&ViewSnapshot> {
        self.snapshot.as_ref()
    }

    /// Queues a seek for the TUI loop. A newer request replaces an unconsumed older one, which is
    /// returned.
    pub fn request_seek(&mut self, target: Address) -> Option<Address> {
        let replaced = self.pending_seek.replace(target);
        self.rev = self.rev.wrapping_add(1);
        replaced
    }

    pub fn take_pending_seek(&mut self) -> Option<Address> {
        let taken = self.pending_seek.take();
        if taken.is_some() {
            self.rev = self.rev.wrapping_add(1);
        }
        taken
    }

    /// Stores `snapshot` unless it equals the current one. Returns whether anything changed.
    pub fn publish(&mut self, snapshot: ViewSnapshot) -> bool {
        if self.snapshot.as_ref() == Some(&snapshot) {
            return false;
        }
        self.snapshot = Some(snapshot);
        self.rev = self.rev.wrapping_add(1);
        true
    }
}
