// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};
use tokio::sync::Mutex;

use crate::model::RefDirection;
use crate::ui::{UiState, ViewSnapshot};
use crate::viewport::fanout::RefEntry;
use crate::viewport::{resolve_seek_target, SeekTarget};

use super::types::*;

/// MCP surface over the shared UI state.
///
/// Reads come from the snapshot the TUI publishes; `view.seek` only queues a request that the
/// TUI applies on its next cycle.
#[derive(Clone)]
pub struct DisviewMcp {
    ui_state: Arc<Mutex<UiState>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DisviewMcp {
    pub fn new(ui_state: Arc<Mutex<UiState>>) -> Self {
        Self {
            ui_state,
            tool_router: Self::tool_router(),
        }
    }

    /// Runs `read` against the latest snapshot while holding the lock.
    async fn with_snapshot<T>(
        &self,
        read: impl FnOnce(Option<&ViewSnapshot>, ReadContext) -> T,
    ) -> T {
        let ui_state = self.ui_state.lock().await;
        let snapshot = ui_state.snapshot();
        let context = ReadContext {
            ui_rev: ui_state.rev(),
            attached: snapshot.is_some(),
        };
        read(snapshot, context)
    }

    /// Read the viewport: anchor, cursor, scroll, visible text, pending seek and seek history.
    #[tool(name = "view.read_state")]
    async fn view_read_state(&self) -> Result<Json<ViewReadStateResponse>, ErrorData> {
        let ui_state = self.ui_state.lock().await;
        let pending_seek = ui_state.pending_seek().map(|address| address.to_string());
        let context = ReadContext {
            ui_rev: ui_state.rev(),
            attached: ui_state.snapshot().is_some(),
        };

        let response = match ui_state.snapshot() {
            Some(snapshot) => ViewReadStateResponse {
                anchor: snapshot.anchor.map(|address| address.to_string()),
                cursor: ViewCursor {
                    line: snapshot.cursor.line as u64,
                    column: snapshot.cursor.column as u64,
                },
                scroll_top: snapshot.scroll_top as u64,
                height: snapshot.height as u64,
                line_count: snapshot.line_count as u64,
                visible_lines: snapshot.visible_lines.clone(),
                pending_seek,
                history: snapshot.history.iter().map(ToString::to_string).collect(),
                context,
            },
            None => ViewReadStateResponse {
                anchor: None,
                cursor: ViewCursor { line: 0, column: 0 },
                scroll_top: 0,
                height: 0,
                line_count: 0,
                visible_lines: Vec::new(),
                pending_seek,
                history: Vec::new(),
                context,
            },
        };
        Ok(Json(response))
    }

    /// Move the viewport to a hex address or a function name. The TUI applies the request on its
    /// next cycle; a newer request replaces one that was not applied yet.
    #[tool(name = "view.seek")]
    async fn view_seek(
        &self,
        params: Parameters<ViewSeekParams>,
    ) -> Result<Json<ViewSeekResponse>, ErrorData> {
        let ViewSeekParams { target } = params.0;

        let mut ui_state = self.ui_state.lock().await;
        let functions = ui_state
            .snapshot()
            .map(|snapshot| snapshot.functions.as_slice())
            .unwrap_or(&[]);
        let Some(resolved) = resolve_seek_target(&target, functions) else {
            return Err(ErrorData::invalid_params(
                "target is neither a hex address nor a known function name",
                Some(serde_json::json!({ "target": target })),
            ));
        };

        let function = match &resolved {
            SeekTarget::Function { name, .. } => Some(name.clone()),
            SeekTarget::Address(_) => None,
        };
        let replaced = ui_state.request_seek(resolved.address());
        log::info!("MCP seek {target:?} queued as {}", resolved.address());

        Ok(Json(ViewSeekResponse {
            address: resolved.address().to_string(),
            function,
            replaced: replaced.map(|address| address.to_string()),
            context: ReadContext {
                ui_rev: ui_state.rev(),
                attached: ui_state.snapshot().is_some(),
            },
        }))
    }

    /// Read the focused address, its owning function and the line under the cursor.
    #[tool(name = "focus.read")]
    async fn focus_read(&self) -> Result<Json<FocusReadResponse>, ErrorData> {
        let response = self
            .with_snapshot(|snapshot, context| match snapshot {
                Some(snapshot) => FocusReadResponse {
                    address: snapshot.focus.last_address().map(|address| address.to_string()),
                    function: non_empty(snapshot.focus.last_function()),
                    cursor_line: snapshot.cursor_line().map(str::to_owned),
                    context,
                },
                None => FocusReadResponse {
                    address: None,
                    function: None,
                    cursor_line: None,
                    context,
                },
            })
            .await;
        Ok(Json(response))
    }

    /// Read the synchronized panels for the current focus (metadata, jump preview, label,
    /// metrics, decompiled body, mini graph).
    #[tool(name = "panels.read")]
    async fn panels_read(&self) -> Result<Json<PanelsReadResponse>, ErrorData> {
        let response = self
            .with_snapshot(|snapshot, context| {
                let Some(snapshot) = snapshot else {
                    return PanelsReadResponse {
                        function_label: None,
                        offset_rows: Vec::new(),
                        opcode: None,
                        jump_preview: None,
                        metrics: None,
                        decompiled: None,
                        mini_graph: None,
                        context,
                    };
                };
                panels_response(snapshot, context)
            })
            .await;
        Ok(Json(response))
    }

    /// List cross references of the focused function; `direction` is `outgoing` or `incoming`.
    #[tool(name = "xref.list")]
    async fn xref_list(
        &self,
        params: Parameters<XRefListParams>,
    ) -> Result<Json<XRefListResponse>, ErrorData> {
        let direction = params
            .0
            .direction
            .as_deref()
            .filter(|direction| !direction.is_empty())
            .map(|raw| {
                raw.parse::<RefDirection>().map_err(|_| {
                    ErrorData::invalid_params(
                        "invalid direction (expected outgoing|incoming)",
                        Some(serde_json::json!({ "direction": raw })),
                    )
                })
            })
            .transpose()?;

        let directions: &[RefDirection] = match direction {
            Some(RefDirection::Outgoing) => &[RefDirection::Outgoing],
            Some(RefDirection::Incoming) => &[RefDirection::Incoming],
            None => &[RefDirection::Outgoing, RefDirection::Incoming],
        };

        let response = self
            .with_snapshot(|snapshot, context| {
                let mut xrefs = Vec::new();
                if let Some(lists) = snapshot.and_then(|snapshot| snapshot.panels.references()) {
                    for &direction in directions {
                        xrefs.extend(
                            lists
                                .entries(direction)
                                .iter()
                                .map(|entry| xref_summary(direction, entry)),
                        );
                    }
                }
                XRefListResponse { xrefs, context }
            })
            .await;
        Ok(Json(response))
    }
}

#[tool_handler]
impl ServerHandler for DisviewMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "disview disassembly viewport server (tools: view.read_state, view.seek, focus.read, panels.read, xref.list)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Snapshot to wire-type mapping for the tool handlers.
include!("server/helpers.rs");
