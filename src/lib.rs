// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! disview: a disassembly viewport that keeps its side panels in sync with the cursor.
//!
//! The core lives in [`viewport`] and talks to the analysis backend only through
//! [`engine::AnalysisEngine`]. [`tui`] and [`mcp`] are the front ends; [`ui`] bridges them.

pub mod config;
pub mod engine;
pub mod mcp;
pub mod model;
pub mod store;
pub mod tui;
pub mod ui;
pub mod viewport;
