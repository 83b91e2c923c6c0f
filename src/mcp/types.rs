// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire types for MCP tools. Addresses travel as normalized hex strings (`0x00401000`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Revision of the shared UI state the response was read from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadContext {
    pub ui_rev: u64,
    /// `false` until the TUI has published its first snapshot.
    pub attached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewCursor {
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewReadStateResponse {
    pub anchor: Option<String>,
    pub cursor: ViewCursor,
    pub scroll_top: u64,
    pub height: u64,
    pub line_count: u64,
    pub visible_lines: Vec<String>,
    pub pending_seek: Option<String>,
    /// Most recent first.
    pub history: Vec<String>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ViewSeekParams {
    /// Hex address (`0x401000`) or function name.
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewSeekResponse {
    pub address: String,
    /// Set when the target resolved through a function name.
    pub function: Option<String>,
    /// An earlier request this one superseded before the TUI consumed it.
    pub replaced: Option<String>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FocusReadResponse {
    pub address: Option<String>,
    pub function: Option<String>,
    pub cursor_line: Option<String>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpMetadataRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpOpcode {
    pub mnemonic: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpJumpPreview {
    pub target: String,
    pub lines: Vec<String>,
    pub highlight: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpMetrics {
    pub cyclomatic_complexity: u64,
    pub outgoing: u64,
    pub basic_blocks: u64,
    pub incoming: u64,
    pub exit_blocks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PanelsReadResponse {
    pub function_label: Option<String>,
    pub offset_rows: Vec<McpMetadataRow>,
    pub opcode: Option<McpOpcode>,
    pub jump_preview: Option<McpJumpPreview>,
    pub metrics: Option<McpMetrics>,
    pub decompiled: Option<String>,
    pub mini_graph: Option<String>,
    pub context: ReadContext,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct XRefListParams {
    /// `outgoing` or `incoming`; both when omitted.
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct XRefSummary {
    pub direction: String,
    pub kind: String,
    pub from: String,
    pub to: String,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct XRefListResponse {
    pub xrefs: Vec<XRefSummary>,
    pub context: ReadContext,
}
