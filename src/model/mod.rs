// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Address-domain value types shared by the engine seam, the viewport core and the front ends.

pub mod address;
pub mod function;
pub mod metrics;
pub mod xref;

pub use address::{normalize_address_text, Address, ParseAddressError, ADDRESS_WIDTH, HEX_MARKER};
pub use function::FunctionRecord;
pub use metrics::GraphMetrics;
pub use xref::{ParseRefDirectionError, RefDirection, RefEdge, RefKind};
