// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fan-out of one focus change to the dependent panels.
//!
//! Every panel has one handler in a fixed, ordered list. A handler queries the engine and turns
//! the answer into a [`PanelWrite`]: content, or a clear when the engine had nothing. A handler
//! error leaves its panel untouched and is reported; it never stops the handlers after it.
//! [`fan_out`] itself does not touch any presentation state, so it can be tested as a pure
//! mapping from event to writes.

use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;
use thiserror::Error;

use crate::engine::{AnalysisEngine, EngineError};
use crate::model::{Address, GraphMetrics, RefDirection, RefEdge};

use super::parser::parse_line_address;
use super::templates::{ChartPages, TemplateError, TemplateStore};

/// The address under the cursor, the function owning it and the rendered line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusChanged {
    pub address: Address,
    pub function: SmolStr,
    pub line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelTier {
    /// Refreshed on every focus change.
    PerAddress,
    /// Refreshed only when the owning function changes.
    PerFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelKind {
    OffsetInfo,
    JumpPreview,
    FunctionLabel,
    References,
    Charts,
    Decompiled,
    MiniGraph,
}

impl PanelKind {
    /// Handler order.
    pub const ORDERED: [PanelKind; 7] = [
        PanelKind::OffsetInfo,
        PanelKind::JumpPreview,
        PanelKind::FunctionLabel,
        PanelKind::References,
        PanelKind::Charts,
        PanelKind::Decompiled,
        PanelKind::MiniGraph,
    ];

    pub fn tier(self) -> PanelTier {
        match self {
            Self::OffsetInfo | Self::JumpPreview => PanelTier::PerAddress,
            Self::FunctionLabel
            | Self::References
            | Self::Charts
            | Self::Decompiled
            | Self::MiniGraph => PanelTier::PerFunction,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffsetInfo => "offset",
            Self::JumpPreview => "jump_preview",
            Self::FunctionLabel => "function",
            Self::References => "references",
            Self::Charts => "charts",
            Self::Decompiled => "decompiled",
            Self::MiniGraph => "mini_graph",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which handlers a fan-out runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutScope {
    PerAddressOnly,
    Full,
}

impl FanOutScope {
    fn includes(self, kind: PanelKind) -> bool {
        match self {
            Self::Full => true,
            Self::PerAddressOnly => kind.tier() == PanelTier::PerAddress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeDescription {
    pub mnemonic: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetInfo {
    pub rows: Vec<MetadataRow>,
    pub description: Option<OpcodeDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpPreview {
    pub target: Address,
    pub lines: Vec<String>,
    /// Index into `lines` of the line starting at `target`.
    pub highlight: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    pub edge: RefEdge,
    /// Callee for outgoing entries, caller for incoming ones.
    pub address: Address,
    /// Disassembly of the referring instruction.
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceLists {
    pub outgoing: Vec<RefEntry>,
    pub incoming: Vec<RefEntry>,
}

impl ReferenceLists {
    pub fn entries(&self, direction: RefDirection) -> &[RefEntry] {
        match direction {
            RefDirection::Outgoing => &self.outgoing,
            RefDirection::Incoming => &self.incoming,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charts {
    pub metrics: GraphMetrics,
    pub pages: ChartPages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniGraph {
    pub description: String,
    pub page: String,
}

/// One update to one presentation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelWrite {
    OffsetInfo(OffsetInfo),
    JumpPreview(JumpPreview),
    FunctionLabel(String),
    References(ReferenceLists),
    Charts(Charts),
    Decompiled(String),
    MiniGraph(MiniGraph),
    Clear(PanelKind),
}

impl PanelWrite {
    pub fn kind(&self) -> PanelKind {
        match self {
            Self::OffsetInfo(_) => PanelKind::OffsetInfo,
            Self::JumpPreview(_) => PanelKind::JumpPreview,
            Self::FunctionLabel(_) => PanelKind::FunctionLabel,
            Self::References(_) => PanelKind::References,
            Self::Charts(_) => PanelKind::Charts,
            Self::Decompiled(_) => PanelKind::Decompiled,
            Self::MiniGraph(_) => PanelKind::MiniGraph,
            Self::Clear(kind) => *kind,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear(_))
    }
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl PanelError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Engine(_) => "engine",
            Self::Template(_) => "template",
        }
    }
}

/// Inputs shared by every handler that are not engine state.
#[derive(Debug, Clone, Copy)]
pub struct FanOutContext<'a> {
    pub templates: &'a TemplateStore,
    pub preview_lines: usize,
}

/// Reference lists and metrics of the current focus, shared between handlers of one pass.
///
/// Moving the focus to another address drops everything; nothing survives across focus changes.
#[derive(Debug, Clone, Default)]
pub struct FocusCache {
    address: Option<Address>,
    outgoing: Option<Vec<RefEdge>>,
    incoming: Option<Vec<RefEdge>>,
    metrics: Option<GraphMetrics>,
}

impl FocusCache {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn focus_on(&mut self, address: Address) {
        if self.address != Some(address) {
            self.clear();
            self.address = Some(address);
        }
    }

    fn references<E>(
        &mut self,
        engine: &mut E,
        address: Address,
        direction: RefDirection,
    ) -> Result<&[RefEdge], EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        self.focus_on(address);
        let slot = match direction {
            RefDirection::Outgoing => &mut self.outgoing,
            RefDirection::Incoming => &mut self.incoming,
        };
        if slot.is_none() {
            engine.reposition_cursor(address)?;
            *slot = Some(engine.cross_references(address, direction)?);
        }
        Ok(slot.as_deref().unwrap_or(&[]))
    }

    fn metrics<E>(&mut self, engine: &mut E, address: Address) -> Result<GraphMetrics, EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        self.focus_on(address);
        if let Some(metrics) = self.metrics {
            return Ok(metrics);
        }
        let outgoing = self
            .references(engine, address, RefDirection::Outgoing)?
            .len() as u64;
        let incoming = self
            .references(engine, address, RefDirection::Incoming)?
            .len() as u64;
        engine.reposition_cursor(address)?;
        let metrics = GraphMetrics {
            outgoing,
            incoming,
            cyclomatic_complexity: engine.cyclomatic_complexity(address)?,
            basic_blocks: engine.basic_block_count(address)?,
            exit_blocks: engine.exit_block_count(address)?,
        };
        self.metrics = Some(metrics);
        Ok(metrics)
    }
}

#[derive(Debug, Default)]
pub struct FanOutReport {
    pub writes: Vec<PanelWrite>,
    pub failures: Vec<(PanelKind, PanelError)>,
}

type PanelHandler<E> = fn(
    &mut E,
    &FocusChanged,
    &FanOutContext<'_>,
    &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>;

fn handler<E>(kind: PanelKind) -> PanelHandler<E>
where
    E: AnalysisEngine + ?Sized,
{
    match kind {
        PanelKind::OffsetInfo => offset_info::<E>,
        PanelKind::JumpPreview => jump_preview::<E>,
        PanelKind::FunctionLabel => function_label::<E>,
        PanelKind::References => references::<E>,
        PanelKind::Charts => charts::<E>,
        PanelKind::Decompiled => decompiled::<E>,
        PanelKind::MiniGraph => mini_graph::<E>,
    }
}

/// Runs the handlers selected by `scope` in [`PanelKind::ORDERED`] order.
pub fn fan_out<E>(
    engine: &mut E,
    event: &FocusChanged,
    scope: FanOutScope,
    ctx: &FanOutContext<'_>,
    cache: &mut FocusCache,
) -> FanOutReport
where
    E: AnalysisEngine + ?Sized,
{
    let mut report = FanOutReport::default();
    for kind in PanelKind::ORDERED {
        if !scope.includes(kind) {
            continue;
        }
        match handler::<E>(kind)(engine, event, ctx, cache) {
            Ok(Some(write)) => report.writes.push(write),
            Ok(None) => report.writes.push(PanelWrite::Clear(kind)),
            Err(err) => {
                log::warn!("{kind} panel at {}: {err}", event.address);
                report.failures.push((kind, err));
            }
        }
    }
    report
}

/// Splits `label: value` lines on the first colon; the label is shown upper-cased.
pub fn parse_offset_rows(text: &str) -> Vec<MetadataRow> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(':') {
            Some((label, value)) => MetadataRow {
                label: label.trim().to_uppercase(),
                value: value.trim().to_owned(),
            },
            None => MetadataRow {
                label: line.to_uppercase(),
                value: String::new(),
            },
        })
        .collect()
}

fn offset_info<E>(
    engine: &mut E,
    event: &FocusChanged,
    _ctx: &FanOutContext<'_>,
    _cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    engine.reposition_cursor(event.address)?;
    let rows = parse_offset_rows(&engine.offset_info(event.address)?);
    let description = engine
        .opcode_description(event.address)?
        .split_once(": ")
        .map(|(mnemonic, text)| OpcodeDescription {
            mnemonic: mnemonic.trim().to_owned(),
            text: text.trim().to_owned(),
        });

    if rows.is_empty() && description.is_none() {
        return Ok(None);
    }
    Ok(Some(PanelWrite::OffsetInfo(OffsetInfo { rows, description })))
}

fn jump_preview<E>(
    engine: &mut E,
    event: &FocusChanged,
    ctx: &FanOutContext<'_>,
    _cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    let Some(target) = engine.jump_target(&event.line)? else {
        return Ok(None);
    };

    // Prefer a window that starts at the target's function so the target shows in context.
    let function_entry = engine
        .functions()
        .into_iter()
        .find(|record| record.contains(target))
        .map(|record| record.entry())
        .filter(|entry| *entry != target);

    let mut starts: SmallVec<[Address; 2]> = SmallVec::new();
    starts.extend(function_entry);
    starts.push(target);

    let mut fallback = None;
    for start in starts {
        engine.reposition_cursor(start)?;
        let text = engine.disassemble_batch(ctx.preview_lines)?;
        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        if lines.is_empty() {
            continue;
        }
        let highlight = lines
            .iter()
            .position(|line| parse_line_address(line) == Some(target));
        let preview = JumpPreview {
            target,
            lines,
            highlight,
        };
        if highlight.is_some() {
            return Ok(Some(PanelWrite::JumpPreview(preview)));
        }
        fallback.get_or_insert(preview);
    }
    Ok(fallback.map(PanelWrite::JumpPreview))
}

fn function_label<E>(
    engine: &mut E,
    event: &FocusChanged,
    _ctx: &FanOutContext<'_>,
    _cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    engine.reposition_cursor(event.address)?;
    let label = match engine.function_at(event.address)? {
        Some(record) => record.qualified_name(),
        None => event.function.to_string(),
    };
    if label.is_empty() {
        return Ok(None);
    }
    Ok(Some(PanelWrite::FunctionLabel(label)))
}

fn references<E>(
    engine: &mut E,
    event: &FocusChanged,
    _ctx: &FanOutContext<'_>,
    cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    let mut lists = ReferenceLists::default();
    for direction in [RefDirection::Outgoing, RefDirection::Incoming] {
        let edges = cache.references(engine, event.address, direction)?.to_vec();
        let mut entries = Vec::with_capacity(edges.len());
        for edge in edges {
            let preview = engine.disassemble_single(edge.from())?.trim().to_owned();
            entries.push(RefEntry {
                address: edge.display_address(direction),
                edge,
                preview,
            });
        }
        match direction {
            RefDirection::Outgoing => lists.outgoing = entries,
            RefDirection::Incoming => lists.incoming = entries,
        }
    }

    if lists.outgoing.is_empty() && lists.incoming.is_empty() {
        return Ok(None);
    }
    Ok(Some(PanelWrite::References(lists)))
}

fn charts<E>(
    engine: &mut E,
    event: &FocusChanged,
    ctx: &FanOutContext<'_>,
    cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    let metrics = cache.metrics(engine, event.address)?;
    if metrics == GraphMetrics::default() {
        return Ok(None);
    }
    let pages = ctx.templates.render_charts(&metrics)?;
    Ok(Some(PanelWrite::Charts(Charts { metrics, pages })))
}

fn decompiled<E>(
    engine: &mut E,
    event: &FocusChanged,
    _ctx: &FanOutContext<'_>,
    _cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    if event.function.is_empty() {
        return Ok(None);
    }
    let text = engine.decompile(&event.function)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(PanelWrite::Decompiled(text)))
}

fn mini_graph<E>(
    engine: &mut E,
    event: &FocusChanged,
    ctx: &FanOutContext<'_>,
    _cache: &mut FocusCache,
) -> Result<Option<PanelWrite>, PanelError>
where
    E: AnalysisEngine + ?Sized,
{
    if event.function.is_empty() {
        return Ok(None);
    }
    let description = engine.simplified_graph(&event.function)?;
    if description.trim().is_empty() {
        return Ok(None);
    }
    let page = ctx.templates.render_graph(&description)?;
    Ok(Some(PanelWrite::MiniGraph(MiniGraph { description, page })))
}

#[cfg(test)]
mod tests {
    use smol_str::SmolStr;

    use super::{
        fan_out, parse_offset_rows, FanOutContext, FanOutScope, FocusCache, FocusChanged,
        PanelKind, PanelWrite,
    };
    use crate::engine::fixture::tests::tiny_program;
    use crate::engine::{AnalysisEngine, FixtureEngine};
    use crate::model::Address;
    use crate::viewport::templates::TemplateStore;

    fn focus(engine: &mut FixtureEngine, address: u64) -> FocusChanged {
        let address = Address::new(address);
        FocusChanged {
            address,
            function: SmolStr::new(engine.function_name_at(address).expect("name")),
            line: engine.disassemble_single(address).expect("line"),
        }
    }

    #[test]
    fn offset_rows_split_on_first_colon() {
        let rows = parse_offset_rows("section: .text\n\noffset: main+0x4\nflag\nmap: a:b\n");
        let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, ["SECTION", "OFFSET", "FLAG", "MAP"]);
        assert_eq!(rows[3].value, "a:b");
    }

    #[test]
    fn full_fan_out_writes_every_panel_in_order() {
        let mut engine = FixtureEngine::new(tiny_program());
        let event = focus(&mut engine, 0x100c);
        let templates = TemplateStore::builtin();
        let ctx = FanOutContext {
            templates: &templates,
            preview_lines: 8,
        };
        let report = fan_out(
            &mut engine,
            &event,
            FanOutScope::Full,
            &ctx,
            &mut FocusCache::default(),
        );

        assert!(report.failures.is_empty());
        let kinds: Vec<PanelKind> = report.writes.iter().map(PanelWrite::kind).collect();
        assert_eq!(kinds, PanelKind::ORDERED);

        let PanelWrite::JumpPreview(preview) = &report.writes[1] else {
            panic!("expected jump preview, got {:?}", report.writes[1]);
        };
        assert_eq!(preview.target, Address::new(0x2000));
        assert_eq!(preview.highlight, Some(0));
    }

    #[test]
    fn per_address_scope_skips_function_panels() {
        let mut engine = FixtureEngine::new(tiny_program());
        let event = focus(&mut engine, 0x1001);
        let templates = TemplateStore::builtin();
        let ctx = FanOutContext {
            templates: &templates,
            preview_lines: 8,
        };
        let report = fan_out(
            &mut engine,
            &event,
            FanOutScope::PerAddressOnly,
            &ctx,
            &mut FocusCache::default(),
        );
        let kinds: Vec<PanelKind> = report.writes.iter().map(PanelWrite::kind).collect();
        assert_eq!(kinds, [PanelKind::OffsetInfo, PanelKind::JumpPreview]);
        assert_eq!(report.writes[1], PanelWrite::Clear(PanelKind::JumpPreview));
    }

    #[test]
    fn empty_engine_answers_clear_panels() {
        let mut engine = FixtureEngine::new(tiny_program());
        let event = focus(&mut engine, 0x2000);
        let templates = TemplateStore::builtin();
        let ctx = FanOutContext {
            templates: &templates,
            preview_lines: 8,
        };
        let report = fan_out(
            &mut engine,
            &event,
            FanOutScope::Full,
            &ctx,
            &mut FocusCache::default(),
        );
        assert!(report
            .writes
            .contains(&PanelWrite::Clear(PanelKind::Decompiled)));
    }

    #[test]
    fn template_failure_only_affects_its_panel() {
        let mut engine = FixtureEngine::new(tiny_program());
        let event = focus(&mut engine, 0x1004);
        let templates =
            TemplateStore::from_dir(std::env::temp_dir().join("disview-fanout-missing-templates"));
        let ctx = FanOutContext {
            templates: &templates,
            preview_lines: 8,
        };
        let report = fan_out(
            &mut engine,
            &event,
            FanOutScope::Full,
            &ctx,
            &mut FocusCache::default(),
        );

        let failed: Vec<PanelKind> = report.failures.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(failed, [PanelKind::Charts, PanelKind::MiniGraph]);
        assert!(report
            .writes
            .iter()
            .any(|write| write.kind() == PanelKind::Decompiled && !write.is_clear()));
    }
}
