// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use super::address::Address;

/// Structured function info returned when an address is a known function entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    name: SmolStr,
    entry: Address,
    size: u64,
    section: Option<SmolStr>,
}

impl FunctionRecord {
    pub fn new(name: impl Into<SmolStr>, entry: Address, size: u64) -> Self {
        Self {
            name: name.into(),
            entry,
            size,
            section: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<SmolStr>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Address {
        self.entry
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn contains(&self, address: Address) -> bool {
        address
            .offset_from(self.entry)
            .is_some_and(|delta| delta < self.size.max(1))
    }

    /// `section:name` when the section is known, otherwise the bare name.
    pub fn qualified_name(&self) -> String {
        match self.section() {
            Some(section) => format!("{}:{}", section.trim(), self.name),
            None => self.name.to_string(),
        }
    }
}
