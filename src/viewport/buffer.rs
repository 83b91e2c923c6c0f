// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::Address;

use super::parser::parse_line_address;

/// Cursor location inside the materialized text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CursorPos {
    pub line: usize,
    pub column: usize,
}

impl CursorPos {
    pub const TOP: Self = Self { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The materialized disassembly text plus anchor, cursor and scroll position.
///
/// Only a full replace or an append mutates the text. The anchor is the address the first line
/// starts with; `None` is the transient "not yet seeked" state.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    lines: Vec<String>,
    anchor: Option<Address>,
    cursor: CursorPos,
    scroll_top: usize,
    height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn anchor(&self) -> Option<Address> {
        self.anchor
    }

    pub fn cursor(&self) -> CursorPos {
        self.cursor
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Replaces the whole text and anchor; cursor and scroll are clamped, not reset.
    pub(crate) fn replace(&mut self, anchor: Option<Address>, lines: Vec<String>) {
        self.anchor = anchor;
        self.lines = lines;
        self.clamp();
    }

    pub(crate) fn append<I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let before = self.lines.len();
        self.lines.extend(lines.into_iter().map(Into::into));
        self.lines.len() - before
    }

    /// Returns whether the cursor moved.
    pub(crate) fn set_cursor(&mut self, cursor: CursorPos) -> bool {
        let clamped = self.clamp_cursor(cursor);
        if clamped == self.cursor {
            return false;
        }
        self.cursor = clamped;
        true
    }

    /// Returns whether the scroll position changed.
    pub(crate) fn set_scroll_top(&mut self, scroll_top: usize) -> bool {
        let clamped = scroll_top.min(self.max_scroll());
        if clamped == self.scroll_top {
            return false;
        }
        self.scroll_top = clamped;
        true
    }

    /// Returns whether the scroll position had to move to stay in range.
    pub(crate) fn set_height(&mut self, height: usize) -> bool {
        self.height = height.max(1);
        let clamped = self.scroll_top.min(self.max_scroll());
        let moved = clamped != self.scroll_top;
        self.scroll_top = clamped;
        moved
    }

    pub fn cursor_line_text(&self) -> Option<&str> {
        self.lines.get(self.cursor.line).map(String::as_str)
    }

    pub fn last_line_text(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn last_line_address(&self) -> Option<Address> {
        self.last_line_text().and_then(parse_line_address)
    }

    pub fn cursor_address(&self) -> Option<Address> {
        self.cursor_line_text().and_then(parse_line_address)
    }

    /// Line index of the first line that starts with `address`.
    pub fn find_address(&self, address: Address) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| parse_line_address(line) == Some(address))
    }

    /// Lines currently on screen.
    pub fn visible_lines(&self) -> &[String] {
        let start = self.scroll_top.min(self.lines.len());
        let end = (start + self.height).min(self.lines.len());
        &self.lines[start..end]
    }

    fn clamp_cursor(&self, cursor: CursorPos) -> CursorPos {
        if self.lines.is_empty() {
            return CursorPos::TOP;
        }
        let line = cursor.line.min(self.lines.len() - 1);
        let width = self.lines[line].chars().count();
        CursorPos::new(line, cursor.column.min(width))
    }

    fn clamp(&mut self) {
        self.cursor = self.clamp_cursor(self.cursor);
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }
}
