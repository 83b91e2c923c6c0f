// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Turning seek prompt input into a target address.

use crate::model::{Address, FunctionRecord};

/// Fuzzy matches below this ratio are not offered as a seek target.
const MIN_FUZZY_RATIO: f64 = 0.5;

/// What a seek query resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekTarget {
    Address(Address),
    Function { name: String, entry: Address },
}

impl SeekTarget {
    pub fn address(&self) -> Address {
        match self {
            Self::Address(address) => *address,
            Self::Function { entry, .. } => *entry,
        }
    }
}

/// Resolves `query` as a hex address (`0x401000`) or a function name.
///
/// Names match exactly first, then by case-insensitive substring (shortest name wins), then by
/// fuzzy ratio. Bare hex that also names a function (`add`, `cafe`) prefers the function.
pub fn resolve_seek_target(query: &str, functions: &[FunctionRecord]) -> Option<SeekTarget> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let prefixed = query.starts_with("0x") || query.starts_with("0X");
    if prefixed {
        return query.parse().ok().map(SeekTarget::Address);
    }

    if let Some(found) = match_function(query, functions) {
        return Some(found);
    }
    query.parse().ok().map(SeekTarget::Address)
}

fn match_function(query: &str, functions: &[FunctionRecord]) -> Option<SeekTarget> {
    let to_target = |record: &FunctionRecord| SeekTarget::Function {
        name: record.name().to_owned(),
        entry: record.entry(),
    };

    if let Some(record) = functions.iter().find(|record| record.name() == query) {
        return Some(to_target(record));
    }

    let needle = query.to_lowercase();
    if let Some(record) = functions
        .iter()
        .filter(|record| record.name().to_lowercase().contains(&needle))
        .min_by_key(|record| record.name().len())
    {
        return Some(to_target(record));
    }

    functions
        .iter()
        .map(|record| {
            let haystack = record.name().to_lowercase();
            let ratio = rapidfuzz::fuzz::ratio(needle.chars(), haystack.chars());
            (record, ratio)
        })
        .filter(|(_, ratio)| *ratio >= MIN_FUZZY_RATIO)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(record, _)| to_target(record))
}
