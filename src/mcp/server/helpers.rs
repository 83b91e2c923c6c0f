// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn panels_response(snapshot: &ViewSnapshot, context: ReadContext) -> PanelsReadResponse {
    let panels = &snapshot.panels;
    let (offset_rows, opcode) = match panels.offset() {
        Some(offset) => (
            offset
                .rows
                .iter()
                .map(|row| McpMetadataRow {
                    label: row.label.clone(),
                    value: row.value.clone(),
                })
                .collect(),
            offset.description.as_ref().map(|description| McpOpcode {
                mnemonic: description.mnemonic.clone(),
                text: description.text.clone(),
            }),
        ),
        None => (Vec::new(), None),
    };

    PanelsReadResponse {
        function_label: panels.function_label().map(str::to_owned),
        offset_rows,
        opcode,
        jump_preview: panels.jump_preview().map(|preview| McpJumpPreview {
            target: preview.target.to_string(),
            lines: preview.lines.clone(),
            highlight: preview.highlight.map(|idx| idx as u64),
        }),
        metrics: panels.charts().map(|charts| McpMetrics {
            cyclomatic_complexity: charts.metrics.cyclomatic_complexity,
            outgoing: charts.metrics.outgoing,
            basic_blocks: charts.metrics.basic_blocks,
            incoming: charts.metrics.incoming,
            exit_blocks: charts.metrics.exit_blocks,
        }),
        decompiled: panels.decompiled().map(str::to_owned),
        mini_graph: panels.mini_graph().map(|graph| graph.description.clone()),
        context,
    }
}

fn xref_summary(direction: RefDirection, entry: &RefEntry) -> XRefSummary {
    XRefSummary {
        direction: direction.as_str().to_owned(),
        kind: entry.edge.kind().as_str().to_owned(),
        from: entry.edge.from().to_string(),
        to: entry.edge.to().to_string(),
        preview: entry.preview.clone(),
    }
}
