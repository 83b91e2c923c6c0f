// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! Hosts the viewport engine on the terminal thread and paints the disassembly pane and the
//! synchronized panels (ratatui + crossterm).

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use tokio::sync::Mutex;

use crate::config::ViewportConfig;
use crate::engine::AnalysisEngine;
use crate::model::{GraphMetrics, RefDirection};
use crate::ui::{UiState, ViewSnapshot};
use crate::viewport::fanout::{JumpPreview, RefEntry};
use crate::viewport::{CursorPos, Panels, ViewportEngine, ViewportEvent};

mod theme;

pub use theme::ThemeError;
use theme::TuiTheme;

const FOOTER_BRAND: &str = "disview ";
const TOAST_TTL: Duration = Duration::from_secs(2);
const INFO_HEIGHT: u16 = 8;
const METRICS_HEIGHT: u16 = 9;

type BoxedEngine = Box<dyn AnalysisEngine>;

/// Runs the interactive terminal UI over `engine`.
pub fn run(engine: BoxedEngine, config: ViewportConfig) -> Result<(), Box<dyn Error>> {
    run_with_ui_state(engine, config, None)
}

pub fn run_with_ui_state(
    engine: BoxedEngine,
    config: ViewportConfig,
    ui_state: Option<Arc<Mutex<UiState>>>,
) -> Result<(), Box<dyn Error>> {
    let theme = TuiTheme::from_env()?;
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(engine, config, theme);
    app.ui_state = ui_state;
    app.start();

    while !app.should_quit {
        app.sync_from_ui_state();
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
        app.publish_to_ui_state();
    }

    Ok(())
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.size();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let main_area = layout[0];
    let status_area = layout[1];

    let (disasm_area, side_area) = if app.side_visible {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(main_area);
        (panes[0], Some(panes[1]))
    } else {
        (main_area, None)
    };

    // The pane height drives the pagination threshold, so the engine learns it before painting.
    let height = disasm_area.height.saturating_sub(2).max(1) as usize;
    app.view.set_viewport_height(height);
    app.drain_view_events();

    draw_disassembly(frame, app, disasm_area);
    if let Some(side_area) = side_area {
        draw_side(frame, app, side_area);
    }

    let toast_snapshot = app
        .toast
        .as_ref()
        .map(|toast| (toast.message.clone(), toast.expires_at));
    let toast_suffix = match toast_snapshot {
        Some((message, expires_at)) if expires_at > Instant::now() => format!(" | {message}"),
        Some(_) => {
            app.toast = None;
            String::new()
        }
        None => String::new(),
    };

    if let Some(query) = app.prompt.as_deref() {
        let status = Paragraph::new(prompt_footer_line(&app.theme, query, &toast_suffix));
        frame.render_widget(status, status_area);
        let cursor_x = status_area
            .x
            .saturating_add(PROMPT_PREFIX.chars().count() as u16)
            .saturating_add(query.chars().count() as u16)
            .min(status_area.x.saturating_add(status_area.width.saturating_sub(1)));
        frame.set_cursor(cursor_x, status_area.y);
        return;
    }

    let status = Paragraph::new(footer_help_line(app, &toast_suffix));
    frame.render_widget(status, status_area);
    let brand = Paragraph::new(footer_brand_line(&app.theme)).alignment(Alignment::Right);
    frame.render_widget(brand, status_area);
}

fn draw_disassembly(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let viewport = app.view.viewport();
    let tail = viewport
        .anchor()
        .map(|anchor| format!("@ {anchor}  {} lines", viewport.line_count()));
    let title = view_title("Disassembly", '1', tail.as_deref());

    let cursor_line = viewport.cursor().line;
    let lines: Vec<Line<'static>> = viewport
        .visible_lines()
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let is_cursor = viewport.scroll_top() + offset == cursor_line;
            disasm_line(line, &app.theme, is_cursor)
        })
        .collect();

    let body = if lines.is_empty() {
        Text::from(Line::styled("No disassembly loaded", app.theme.error_style()))
    } else {
        Text::from(lines)
    };
    let widget = Paragraph::new(body).style(app.theme.base_style()).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(app.theme.panel_border_style(app.pane == Pane::Disassembly)),
    );
    frame.render_widget(widget, area);
}

fn draw_side(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(INFO_HEIGHT),
            Constraint::Percentage(30),
            Constraint::Min(0),
            Constraint::Length(METRICS_HEIGHT),
        ])
        .split(area);

    let panels = app.view.panels();
    let info = Paragraph::new(info_text(panels, &app.theme))
        .style(app.theme.base_style())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(view_title("Offset", '2', None))
                .border_style(app.theme.panel_border_style(false)),
        );
    frame.render_widget(info, rows[0]);

    let xrefs = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    for (direction, pane, key, rect) in [
        (RefDirection::Outgoing, Pane::Outgoing, '3', xrefs[0]),
        (RefDirection::Incoming, Pane::Incoming, '4', xrefs[1]),
    ] {
        let entries = app
            .view
            .panels()
            .references()
            .map(|lists| lists.entries(direction))
            .unwrap_or(&[]);
        let items: Vec<ListItem<'static>> = entries
            .iter()
            .map(|entry| ListItem::new(reference_line(entry, &app.theme)))
            .collect();
        let label = match direction {
            RefDirection::Outgoing => "Calls",
            RefDirection::Incoming => "Callers",
        };
        let count = entries.len().to_string();
        let list = List::new(items)
            .style(app.theme.base_style())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(view_title(label, key, Some(&count)))
                    .border_style(app.theme.panel_border_style(app.pane == pane)),
            )
            .highlight_style(app.theme.selection_style());
        let state = match direction {
            RefDirection::Outgoing => &mut app.outgoing_state,
            RefDirection::Incoming => &mut app.incoming_state,
        };
        frame.render_stateful_widget(list, rect, state);
    }

    draw_tab_body(frame, app, rows[2]);
    draw_metrics(frame, app, rows[3]);
}

fn draw_tab_body(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let tabs = Tabs::new(SideTab::ALL.iter().map(|tab| tab.title()).collect::<Vec<_>>())
        .select(app.tab.index())
        .style(app.theme.footer_label_style())
        .highlight_style(app.theme.label_style());
    frame.render_widget(tabs, split[0]);

    let panels = app.view.panels();
    let (text, scroll) = match app.tab {
        SideTab::Preview => match panels.jump_preview() {
            Some(preview) => preview_text(preview, &app.theme),
            None => (placeholder("No jump target", &app.theme), 0),
        },
        SideTab::Decompiled => match panels.decompiled() {
            Some(source) => (Text::from(source.to_owned()), 0),
            None => (placeholder("No decompiled body", &app.theme), 0),
        },
        SideTab::Graph => match panels.mini_graph() {
            Some(graph) => (Text::from(graph.description.clone()), 0),
            None => (placeholder("No graph", &app.theme), 0),
        },
    };

    let title = panels.function_label().unwrap_or("no function").to_owned();
    let body = Paragraph::new(text)
        .style(app.theme.base_style())
        .scroll((scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(view_title(&title, '5', None))
                .border_style(app.theme.panel_border_style(false)),
        );
    frame.render_widget(body, split[1]);
}

fn draw_metrics(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view_title("Metrics", '6', Some(app.chart_mode.as_str())))
        .border_style(app.theme.panel_border_style(false));

    let Some(charts) = app.view.panels().charts() else {
        let empty = Paragraph::new(placeholder("No metrics", &app.theme)).block(block);
        frame.render_widget(empty, area);
        return;
    };

    match app.chart_mode {
        ChartMode::Bar => {
            let data = charts.metrics.labeled();
            let chart = BarChart::default()
                .block(block)
                .data(&data[..])
                .bar_width(5)
                .bar_gap(1)
                .bar_style(app.theme.bar_style())
                .value_style(app.theme.selection_style())
                .label_style(app.theme.footer_label_style());
            frame.render_widget(chart, area);
        }
        ChartMode::Radial => {
            let widget = Paragraph::new(radial_text(&charts.metrics, &app.theme))
                .style(app.theme.base_style())
                .block(block);
            frame.render_widget(widget, area);
        }
    }
}

// Footer, title and line styling helpers.
include!("chrome.rs");

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Disassembly,
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SideTab {
    Preview,
    Decompiled,
    Graph,
}

impl SideTab {
    const ALL: [SideTab; 3] = [SideTab::Preview, SideTab::Decompiled, SideTab::Graph];

    fn index(self) -> usize {
        match self {
            Self::Preview => 0,
            Self::Decompiled => 1,
            Self::Graph => 2,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Preview => "Preview",
            Self::Decompiled => "Decompiled",
            Self::Graph => "Graph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartMode {
    Bar,
    Radial,
}

impl ChartMode {
    fn toggled(self) -> Self {
        match self {
            Self::Bar => Self::Radial,
            Self::Radial => Self::Bar,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Radial => "radial",
        }
    }
}

struct App {
    view: ViewportEngine<BoxedEngine>,
    theme: TuiTheme,
    pane: Pane,
    tab: SideTab,
    chart_mode: ChartMode,
    side_visible: bool,
    outgoing_state: ListState,
    incoming_state: ListState,
    prompt: Option<String>,
    toast: Option<Toast>,
    ui_state: Option<Arc<Mutex<UiState>>>,
    should_quit: bool,
}

impl App {
    fn new(engine: BoxedEngine, config: ViewportConfig, theme: TuiTheme) -> Self {
        Self {
            view: ViewportEngine::new(engine, config),
            theme,
            pane: Pane::Disassembly,
            tab: SideTab::Preview,
            chart_mode: ChartMode::Bar,
            side_visible: true,
            outgoing_state: ListState::default(),
            incoming_state: ListState::default(),
            prompt: None,
            toast: None,
            ui_state: None,
            should_quit: false,
        }
    }

    fn start(&mut self) {
        self.view.setup();
        self.drain_view_events();
        self.publish_to_ui_state();
    }

    /// Applies a seek queued by MCP, if any.
    fn sync_from_ui_state(&mut self) {
        let Some(ui_state) = self.ui_state.as_ref() else {
            return;
        };
        let Some(target) = ui_state.blocking_lock().take_pending_seek() else {
            return;
        };
        log::info!("seek to {target} requested over MCP");
        self.view.seek(target);
        self.drain_view_events();
        self.set_toast(format!("Seek {target} (MCP)"));
    }

    fn publish_to_ui_state(&mut self) {
        let Some(ui_state) = self.ui_state.as_ref() else {
            return;
        };
        let snapshot = ViewSnapshot::capture(&self.view);
        ui_state.blocking_lock().publish(snapshot);
    }

    /// Turns queued viewport events into toasts and keeps list selections in range.
    fn drain_view_events(&mut self) {
        for event in self.view.drain_events() {
            match event {
                ViewportEvent::Notice(message) => self.set_toast(message),
                ViewportEvent::FocusChanged { .. } | ViewportEvent::Refreshed { .. } => {}
            }
        }
        let panels = self.view.panels();
        clamp_list_state(&mut self.outgoing_state, reference_count(panels, RefDirection::Outgoing));
        clamp_list_state(&mut self.incoming_state, reference_count(panels, RefDirection::Incoming));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.handle_key_code(key.code);
    }

    /// Returns whether the key did anything.
    fn handle_key_code(&mut self, code: KeyCode) -> bool {
        let handled = if self.prompt.is_some() {
            self.handle_prompt_key(code)
        } else {
            self.handle_view_key(code)
        };
        self.drain_view_events();
        handled
    }

    fn handle_prompt_key(&mut self, code: KeyCode) -> bool {
        let Some(query) = self.prompt.as_mut() else {
            return false;
        };
        match code {
            KeyCode::Esc => {
                self.prompt = None;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(ch) => query.push(ch),
            KeyCode::Enter => {
                let query = self.prompt.take().unwrap_or_default();
                self.submit_seek(&query);
            }
            _ => return false,
        }
        true
    }

    fn handle_view_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::PageDown => self.page(1),
            KeyCode::PageUp => self.page(-1),
            KeyCode::Home => self.view.move_cursor_to(CursorPos::TOP),
            KeyCode::End => {
                let last = self.view.viewport().line_count().saturating_sub(1);
                self.view.move_cursor_to(CursorPos::new(last, 0));
            }
            KeyCode::Char('g') | KeyCode::Char(':') => self.prompt = Some(String::new()),
            KeyCode::Enter => self.follow(),
            KeyCode::Esc => {
                if !self.view.seek_back() {
                    self.set_toast("Seek history is empty");
                }
            }
            KeyCode::Tab => self.cycle_pane(),
            KeyCode::Char('p') => self.tab = SideTab::Preview,
            KeyCode::Char('d') => self.tab = SideTab::Decompiled,
            KeyCode::Char('v') => self.tab = SideTab::Graph,
            KeyCode::Char('c') => self.chart_mode = self.chart_mode.toggled(),
            KeyCode::Char('t') => {
                let mode = self.theme.toggle_mode();
                self.set_toast(format!("Theme: {}", mode.as_str()));
            }
            KeyCode::Char('r') => {
                self.view.on_analysis_changed();
                self.set_toast("Refreshed");
            }
            KeyCode::Char('s') => {
                self.side_visible = !self.side_visible;
                if !self.side_visible {
                    self.pane = Pane::Disassembly;
                }
            }
            _ => return false,
        }
        true
    }

    fn move_selection(&mut self, delta: isize) {
        let (state, direction) = match self.pane {
            Pane::Disassembly => {
                self.view.move_cursor_by(delta);
                return;
            }
            Pane::Outgoing => (&mut self.outgoing_state, RefDirection::Outgoing),
            Pane::Incoming => (&mut self.incoming_state, RefDirection::Incoming),
        };
        let count = reference_count(self.view.panels(), direction);
        if count == 0 {
            return;
        }
        let current = state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(count - 1);
        state.select(Some(next));
    }

    fn page(&mut self, direction: isize) {
        let height = self.view.viewport().height() as isize;
        self.view.scroll_by(direction * height);
        self.view.move_cursor_by(direction * height);
    }

    fn follow(&mut self) {
        let followed = match self.pane {
            Pane::Disassembly => self.view.follow_jump(),
            Pane::Outgoing => {
                let index = self.outgoing_state.selected().unwrap_or(0);
                self.view.follow_reference(RefDirection::Outgoing, index)
            }
            Pane::Incoming => {
                let index = self.incoming_state.selected().unwrap_or(0);
                self.view.follow_reference(RefDirection::Incoming, index)
            }
        };
        if !followed {
            self.set_toast("Nothing to follow");
        }
    }

    fn cycle_pane(&mut self) {
        self.pane = match (self.pane, self.side_visible) {
            (_, false) => Pane::Disassembly,
            (Pane::Disassembly, true) => Pane::Outgoing,
            (Pane::Outgoing, true) => Pane::Incoming,
            (Pane::Incoming, true) => Pane::Disassembly,
        };
    }

    fn submit_seek(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }
        match self.view.seek_query(query) {
            Some(target) => {
                self.pane = Pane::Disassembly;
                self.set_toast(format!("Seek {}", target.address()));
            }
            None => self.set_toast(format!("No address or function matches {query:?}")),
        }
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }
}

fn reference_count(panels: &Panels, direction: RefDirection) -> usize {
    panels
        .references()
        .map(|lists| lists.entries(direction).len())
        .unwrap_or(0)
}

fn clamp_list_state(state: &mut ListState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(idx), len) if idx >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}
