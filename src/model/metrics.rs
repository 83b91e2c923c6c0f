// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Per-focus numbers that feed the bar and radial charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphMetrics {
    pub outgoing: u64,
    pub incoming: u64,
    pub cyclomatic_complexity: u64,
    pub basic_blocks: u64,
    pub exit_blocks: u64,
}

impl GraphMetrics {
    /// Chart templates receive the values in this order; changing it breaks existing templates.
    pub const CHART_LABELS: [&'static str; 5] = ["cc", "calls", "blocks", "xrefs", "exits"];

    pub fn chart_fields(&self) -> [u64; 5] {
        [
            self.cyclomatic_complexity,
            self.outgoing,
            self.basic_blocks,
            self.incoming,
            self.exit_blocks,
        ]
    }

    pub fn labeled(&self) -> [(&'static str, u64); 5] {
        let values = self.chart_fields();
        let mut out = [("", 0u64); 5];
        for (idx, label) in Self::CHART_LABELS.iter().enumerate() {
            out[idx] = (label, values[idx]);
        }
        out
    }
}
