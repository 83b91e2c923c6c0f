// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Current content of every presentation surface.

use super::fanout::{
    Charts, JumpPreview, MiniGraph, OffsetInfo, PanelKind, PanelWrite, ReferenceLists,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panels {
    rev: u64,
    offset: Option<OffsetInfo>,
    jump_preview: Option<JumpPreview>,
    function_label: Option<String>,
    references: Option<ReferenceLists>,
    charts: Option<Charts>,
    decompiled: Option<String>,
    mini_graph: Option<MiniGraph>,
    writes: [u64; PanelKind::ORDERED.len()],
}

impl Panels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped whenever any panel content changes.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn offset(&self) -> Option<&OffsetInfo> {
        self.offset.as_ref()
    }

    pub fn jump_preview(&self) -> Option<&JumpPreview> {
        self.jump_preview.as_ref()
    }

    pub fn function_label(&self) -> Option<&str> {
        self.function_label.as_deref()
    }

    pub fn references(&self) -> Option<&ReferenceLists> {
        self.references.as_ref()
    }

    pub fn charts(&self) -> Option<&Charts> {
        self.charts.as_ref()
    }

    pub fn decompiled(&self) -> Option<&str> {
        self.decompiled.as_deref()
    }

    pub fn mini_graph(&self) -> Option<&MiniGraph> {
        self.mini_graph.as_ref()
    }

    /// How many writes (including clears) a panel received.
    pub fn write_count(&self, kind: PanelKind) -> u64 {
        self.writes[kind.index()]
    }

    pub fn is_empty(&self, kind: PanelKind) -> bool {
        match kind {
            PanelKind::OffsetInfo => self.offset.is_none(),
            PanelKind::JumpPreview => self.jump_preview.is_none(),
            PanelKind::FunctionLabel => self.function_label.is_none(),
            PanelKind::References => self.references.is_none(),
            PanelKind::Charts => self.charts.is_none(),
            PanelKind::Decompiled => self.decompiled.is_none(),
            PanelKind::MiniGraph => self.mini_graph.is_none(),
        }
    }

    /// Applies one write. Returns whether the visible content changed.
    pub fn apply(&mut self, write: PanelWrite) -> bool {
        let kind = write.kind();
        self.writes[kind.index()] += 1;

        let changed = match write {
            PanelWrite::OffsetInfo(value) => replace(&mut self.offset, Some(value)),
            PanelWrite::JumpPreview(value) => replace(&mut self.jump_preview, Some(value)),
            PanelWrite::FunctionLabel(value) => replace(&mut self.function_label, Some(value)),
            PanelWrite::References(value) => replace(&mut self.references, Some(value)),
            PanelWrite::Charts(value) => replace(&mut self.charts, Some(value)),
            PanelWrite::Decompiled(value) => replace(&mut self.decompiled, Some(value)),
            PanelWrite::MiniGraph(value) => replace(&mut self.mini_graph, Some(value)),
            PanelWrite::Clear(kind) => self.clear(kind),
        };
        if changed {
            self.rev = self.rev.wrapping_add(1);
        }
        changed
    }

    fn clear(&mut self, kind: PanelKind) -> bool {
        match kind {
            PanelKind::OffsetInfo => self.offset.take().is_some(),
            PanelKind::JumpPreview => self.jump_preview.take().is_some(),
            PanelKind::FunctionLabel => self.function_label.take().is_some(),
            PanelKind::References => self.references.take().is_some(),
            PanelKind::Charts => self.charts.take().is_some(),
            PanelKind::Decompiled => self.decompiled.take().is_some(),
            PanelKind::MiniGraph => self.mini_graph.take().is_some(),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
