// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The disassembly viewport and the panels synchronized to its cursor.
//!
//! [`ViewportEngine`] owns the materialized text, the pending navigation, the focus state and
//! the panel contents, and talks to an injected [`AnalysisEngine`]. Front ends feed it user
//! events ([`ViewportEngine::scroll_to`], [`ViewportEngine::move_cursor_to`], seeks) and read
//! back the viewport, the panels and the queued [`ViewportEvent`]s.
//!
//! Everything runs on the caller's thread. Programmatic rewrites of the text detach the scroll
//! and cursor channels for their duration so their own notifications never reach pagination or
//! focus tracking; a forced focus pass afterwards brings the panels up to date.

pub mod buffer;
pub mod fanout;
pub mod focus;
pub mod guard;
pub mod pagination;
pub mod panels;
pub mod parser;
pub mod seek;
pub mod templates;

use std::collections::{BTreeSet, VecDeque};

use smol_str::SmolStr;

use crate::config::ViewportConfig;
use crate::engine::{AnalysisEngine, EngineError};
use crate::model::{Address, RefDirection};

pub use buffer::{CursorPos, Viewport};
pub use fanout::{
    fan_out, FanOutContext, FanOutReport, FanOutScope, FocusCache, FocusChanged, PanelKind,
    PanelTier, PanelWrite,
};
pub use focus::{FocusOutcome, FocusState, FocusTracker};
pub use guard::{Channel, NotificationChannels, SuppressionGuard};
pub use pagination::{PaginationController, PaginationReport, PaginationState, StopReason};
pub use panels::Panels;
pub use parser::parse_line_address;
pub use seek::{resolve_seek_target, SeekTarget};
pub use templates::{TemplateError, TemplateStore};

const DEFAULT_HEIGHT: usize = 32;

/// Notifications raised by the text surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ScrollChanged,
    CursorMoved,
}

impl Notification {
    pub fn channel(self) -> Channel {
        match self {
            Self::ScrollChanged => Channel::Scroll,
            Self::CursorMoved => Channel::Cursor,
        }
    }
}

/// Outbound events for the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportEvent {
    /// The focused address changed.
    FocusChanged {
        address: Address,
        function: SmolStr,
    },
    /// The viewport text was replaced.
    Refreshed {
        anchor: Option<Address>,
        lines: usize,
    },
    /// Something failed unexpectedly; shown to the user once.
    Notice(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewportStats {
    pub refreshes: u64,
    pub focus_passes: u64,
    pub full_fan_outs: u64,
    pub light_fan_outs: u64,
    pub delivered: u64,
    pub suppressed: u64,
}

pub struct ViewportEngine<E> {
    engine: E,
    config: ViewportConfig,
    templates: TemplateStore,
    viewport: Viewport,
    pending_navigation: Option<Address>,
    channels: NotificationChannels,
    pagination: PaginationController,
    focus: FocusTracker,
    cache: FocusCache,
    panels: Panels,
    events: VecDeque<ViewportEvent>,
    last_notice: Option<String>,
    /// Panel failures already shown, keyed by panel and error kind.
    reported_panels: BTreeSet<(PanelKind, &'static str)>,
    history: VecDeque<Address>,
    stats: ViewportStats,
}

impl<E: AnalysisEngine> ViewportEngine<E> {
    pub fn new(engine: E, config: ViewportConfig) -> Self {
        let templates = match config.template_dir() {
            Some(dir) => TemplateStore::from_dir(dir),
            None => TemplateStore::builtin(),
        };
        let pagination = PaginationController::new(
            config.batch_size(),
            config.pass_cap(),
            config.threshold_fraction(),
        );
        Self {
            engine,
            templates,
            viewport: Viewport::new(DEFAULT_HEIGHT),
            pending_navigation: None,
            channels: NotificationChannels::new(),
            pagination,
            focus: FocusTracker::new(),
            cache: FocusCache::default(),
            panels: Panels::new(),
            events: VecDeque::new(),
            last_notice: None,
            reported_panels: BTreeSet::new(),
            history: VecDeque::new(),
            stats: ViewportStats::default(),
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn focus_state(&self) -> &FocusState {
        self.focus.state()
    }

    pub fn channels(&self) -> &NotificationChannels {
        &self.channels
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn pending_navigation(&self) -> Option<Address> {
        self.pending_navigation
    }

    pub fn history(&self) -> impl Iterator<Item = Address> + '_ {
        self.history.iter().rev().copied()
    }

    pub fn stats(&self) -> ViewportStats {
        self.stats
    }

    /// Takes every queued outbound event.
    pub fn drain_events(&mut self) -> Vec<ViewportEvent> {
        self.events.drain(..).collect()
    }

    /// Seeks to the engine's entry point, if it has one.
    pub fn setup(&mut self) {
        match self.engine.entry_address() {
            Some(entry) => {
                self.request_seek(entry);
                self.refresh();
            }
            None => log::info!("engine has no entry point; waiting for a seek"),
        }
    }

    /// Queues a navigation for the next refresh. A later request replaces an earlier one;
    /// the replaced target is returned.
    pub fn request_seek(&mut self, target: Address) -> Option<Address> {
        let replaced = self.pending_navigation.replace(target);
        if let Some(replaced) = replaced {
            log::debug!("seek to {replaced} superseded by {target}");
        }
        replaced
    }

    /// Seeks and refreshes immediately, remembering the current anchor for [`Self::seek_back`].
    /// Nothing is remembered when the seek fails to load.
    pub fn seek(&mut self, target: Address) {
        let previous = self.viewport.anchor().filter(|anchor| *anchor != target);
        self.request_seek(target);
        if !self.reload() {
            return;
        }
        if let Some(anchor) = previous {
            self.history.push_back(anchor);
            while self.history.len() > self.config.history_limit() {
                self.history.pop_front();
            }
        }
    }

    /// Returns to the previous seek target. Returns `false` when the history is empty.
    pub fn seek_back(&mut self) -> bool {
        let Some(previous) = self.history.pop_back() else {
            return false;
        };
        self.request_seek(previous);
        if !self.reload() {
            self.history.push_back(previous);
        }
        true
    }

    /// Resolves seek prompt input (hex address or function name) and seeks there.
    pub fn seek_query(&mut self, query: &str) -> Option<SeekTarget> {
        let target = resolve_seek_target(query, &self.engine.functions())?;
        self.seek(target.address());
        Some(target)
    }

    /// Rebuilds the viewport.
    ///
    /// With a pending navigation the text restarts at that address with cursor and scroll at
    /// the top. Without one the current anchor is reloaded and cursor and scroll are kept.
    /// Both channels stay detached until the rewrite is done, then one focus pass runs.
    pub fn refresh(&mut self) {
        self.reload();
    }

    /// [`Self::refresh`], returning whether the text was rewritten.
    fn reload(&mut self) -> bool {
        let pending = self.pending_navigation.take();
        let soft = pending.is_none();
        let Some(target) = pending.or(self.viewport.anchor()) else {
            log::debug!("refresh without anchor or pending navigation");
            return false;
        };

        let loaded = {
            let _guard = self.channels.suppress(&Channel::ALL);
            match self.rewrite_viewport(target, soft) {
                Ok(()) => true,
                Err(err) => {
                    self.notice(format!("cannot load disassembly at {target}: {err}"));
                    false
                }
            }
        };
        if loaded {
            self.last_notice = None;
        }
        self.ensure_reattached();
        self.focus_pass();
        loaded
    }

    /// The analysis under the viewport changed (comments, flags, options): reload in place
    /// and recompute every panel on the next focus pass.
    pub fn on_analysis_changed(&mut self) {
        self.focus.invalidate();
        self.cache.clear();
        self.reported_panels.clear();
        self.refresh();
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        if height.max(1) == self.viewport.height() {
            return;
        }
        self.viewport.set_height(height);
        self.notify(Notification::ScrollChanged);
    }

    pub fn scroll_to(&mut self, scroll_top: usize) {
        if self.viewport.set_scroll_top(scroll_top) {
            self.notify(Notification::ScrollChanged);
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = self.viewport.scroll_top().saturating_add_signed(delta);
        self.scroll_to(target);
    }

    /// Moves the cursor and scrolls just enough to keep it on screen.
    pub fn move_cursor_to(&mut self, cursor: CursorPos) {
        if !self.viewport.set_cursor(cursor) {
            return;
        }
        self.notify(Notification::CursorMoved);

        let line = self.viewport.cursor().line;
        let top = self.viewport.scroll_top();
        let height = self.viewport.height();
        if line < top {
            self.scroll_to(line);
        } else if line >= top + height {
            self.scroll_to(line + 1 - height);
        }
    }

    pub fn move_cursor_by(&mut self, delta: isize) {
        let current = self.viewport.cursor();
        let line = current.line.saturating_add_signed(delta);
        self.move_cursor_to(CursorPos::new(line, current.column));
    }

    /// Delivers a surface notification unless its channel is detached.
    pub fn notify(&mut self, notification: Notification) {
        if !self.channels.is_attached(notification.channel()) {
            self.stats.suppressed += 1;
            log::trace!("suppressed {notification:?}");
            return;
        }
        self.stats.delivered += 1;
        match notification {
            Notification::ScrollChanged => self.on_scroll(),
            Notification::CursorMoved => self.focus_pass(),
        }
    }

    /// Follows the control transfer under the cursor when it lands inside a known function.
    pub fn follow_jump(&mut self) -> bool {
        let Some(line) = self.viewport.cursor_line_text().map(str::to_owned) else {
            return false;
        };
        let target = match self.resolve_jump(&line) {
            Ok(Some(target)) => target,
            Ok(None) => return false,
            Err(err) => {
                self.notice(format!("cannot follow jump: {err}"));
                return false;
            }
        };
        self.seek(target);
        true
    }

    /// Seeks to the other end of a reference row: the callee of an outgoing row, the caller of
    /// an incoming one.
    pub fn follow_reference(&mut self, direction: RefDirection, index: usize) -> bool {
        let Some(target) = self
            .panels
            .references()
            .and_then(|lists| lists.entries(direction).get(index))
            .map(|entry| entry.address)
        else {
            return false;
        };
        self.seek(target);
        true
    }

    /// One focus tracker pass over the line under the cursor.
    pub fn focus_pass(&mut self) {
        self.stats.focus_passes += 1;
        let line = self.viewport.cursor_line_text().map(str::to_owned);
        let previous = self.focus.state().last_address();

        let outcome = match self.focus.track(&mut self.engine, line.as_deref()) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notice(format!("cannot resolve focus: {err}"));
                return;
            }
        };

        let (event, scope) = match outcome {
            FocusOutcome::Ignored => return,
            FocusOutcome::SameFunction(event) => (event, FanOutScope::PerAddressOnly),
            FocusOutcome::FunctionChanged(event) => (event, FanOutScope::Full),
        };
        self.run_fan_out(&event, scope);

        if previous != Some(event.address) || scope == FanOutScope::Full {
            self.events.push_back(ViewportEvent::FocusChanged {
                address: event.address,
                function: event.function,
            });
        }
    }

    fn run_fan_out(&mut self, event: &FocusChanged, scope: FanOutScope) {
        match scope {
            FanOutScope::Full => self.stats.full_fan_outs += 1,
            FanOutScope::PerAddressOnly => self.stats.light_fan_outs += 1,
        }

        self.cache.clear();
        let ctx = FanOutContext {
            templates: &self.templates,
            preview_lines: self.config.preview_lines(),
        };
        let report = fan_out(&mut self.engine, event, scope, &ctx, &mut self.cache);

        for write in report.writes {
            if !write.is_clear() {
                let kind = write.kind();
                self.reported_panels.retain(|(reported, _)| *reported != kind);
            }
            self.panels.apply(write);
        }
        for (kind, err) in report.failures {
            self.panels.apply(PanelWrite::Clear(kind));
            if self.reported_panels.insert((kind, err.kind())) {
                self.events.push_back(ViewportEvent::Notice(format!("{kind} panel: {err}")));
            }
        }
    }

    fn resolve_jump(&mut self, line: &str) -> Result<Option<Address>, EngineError> {
        let Some(target) = self.engine.jump_target(line)? else {
            return Ok(None);
        };
        let owner = self.engine.function_name_at(target)?;
        Ok((!owner.is_empty()).then_some(target))
    }

    fn on_scroll(&mut self) {
        let result = self
            .pagination
            .paginate(&mut self.engine, &mut self.viewport, &self.channels);
        if let Err(err) = result {
            self.notice(format!("cannot load more disassembly: {err}"));
        }
    }

    fn rewrite_viewport(&mut self, target: Address, soft: bool) -> Result<(), EngineError> {
        self.engine.reposition_cursor(target)?;
        let batch = self.engine.disassemble_batch(self.config.batch_size())?;

        // Leading lines without an address (function headers, blank lines) would break the
        // anchor; the text always starts at the first instruction.
        let lines: Vec<String> = batch
            .lines()
            .skip_while(|line| parse_line_address(line).is_none())
            .map(str::to_owned)
            .collect();
        let anchor = lines.first().and_then(|line| parse_line_address(line));
        match anchor {
            Some(anchor) if anchor != target => {
                log::warn!("anchor realigned from {target} to {anchor}");
            }
            None => log::warn!("no instructions at {target}"),
            _ => {}
        }

        let (cursor, scroll_top) = if soft {
            (self.viewport.cursor(), self.viewport.scroll_top())
        } else {
            (CursorPos::TOP, 0)
        };

        self.pagination.reset();
        self.viewport.replace(anchor.or(Some(target)), lines);
        self.notify(Notification::ScrollChanged);
        if self.viewport.set_scroll_top(scroll_top) {
            self.notify(Notification::ScrollChanged);
        }

        // Pre-fill, putting the scroll position back after every pass so a soft refresh can
        // grow back to where the user was.
        for _ in 0..self.config.pass_cap() {
            let pass = self
                .pagination
                .run_pass(&mut self.engine, &mut self.viewport, &self.channels);
            // The new text is already in place; a failed pass only ends the pre-fill.
            let outcome = match pass {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.notice(format!("cannot load more disassembly at {target}: {err}"));
                    break;
                }
            };
            if self.viewport.set_scroll_top(scroll_top) {
                self.notify(Notification::ScrollChanged);
            }
            if !matches!(outcome, pagination::PassOutcome::Appended { .. }) {
                break;
            }
        }

        if self.viewport.set_cursor(cursor) {
            self.notify(Notification::CursorMoved);
        }

        self.stats.refreshes += 1;
        log::debug!(
            "refresh at {target}: {} lines, soft={soft}",
            self.viewport.line_count()
        );
        self.events.push_back(ViewportEvent::Refreshed {
            anchor: self.viewport.anchor(),
            lines: self.viewport.line_count(),
        });
        Ok(())
    }

    fn ensure_reattached(&mut self) {
        if self.channels.is_idle() {
            return;
        }
        debug_assert!(false, "notification channels still detached after rewrite");
        self.channels.force_reattach();
    }

    /// Queues a user-facing notice, skipping an exact repeat of the previous one.
    fn notice(&mut self, message: String) {
        if self.last_notice.as_deref() == Some(message.as_str()) {
            return;
        }
        log::warn!("{message}");
        self.last_notice = Some(message.clone());
        self.events.push_back(ViewportEvent::Notice(message));
    }
}
