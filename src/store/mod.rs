// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Program images on disk.
//!
//! A program image is a single pretty-printed JSON file describing sections, functions and
//! instructions. Loading validates the image so the fixture engine can rely on sorted,
//! non-overlapping functions.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::engine::Program;
use crate::model::Address;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid program image {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub fn load_program(path: &Path) -> Result<Program, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let program: Program = serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    validate_program(&program).map_err(|reason| StoreError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    log::info!(
        "loaded program {:?} from {path:?} ({} functions)",
        program.name,
        program.functions.len()
    );
    Ok(program)
}

pub fn save_program(path: &Path, program: &Program) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(program).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, format!("{json}\n").as_bytes())
}

/// Checks that instruction addresses increase inside every function and that functions do
/// not overlap each other.
pub fn validate_program(program: &Program) -> Result<(), String> {
    let mut ranges: Vec<(Address, Address, &str)> = Vec::new();
    for function in &program.functions {
        if function.name.trim().is_empty() {
            return Err("function with empty name".to_owned());
        }
        for pair in function.instructions.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            match prev.address.checked_add(prev.byte_len()) {
                Some(end) if end <= next.address => {}
                _ => {
                    return Err(format!(
                        "instruction {} in {} overlaps {}",
                        prev.address, function.name, next.address
                    ));
                }
            }
        }
        if let (Some(entry), Some(end)) = (function.entry(), function.end()) {
            ranges.push((entry, end, function.name.as_str()));
        }
    }

    ranges.sort_by_key(|&(entry, _, _)| entry);
    for pair in ranges.windows(2) {
        let ((_, prev_end, prev_name), (next_entry, _, next_name)) = (pair[0], pair[1]);
        if prev_end > next_entry {
            return Err(format!("functions {prev_name} and {next_name} overlap"));
        }
    }

    if let Some(entry) = program.entry {
        let known = program
            .functions
            .iter()
            .any(|function| function.contains(entry));
        if !known {
            return Err(format!("entry {entry} is not inside any function"));
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error(parent))?;

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".disview.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(io_error(&tmp_path))?;
    file.write_all(contents).map_err(io_error(&tmp_path))?;
    file.sync_all().map_err(io_error(&tmp_path))?;
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

#[cfg(test)]
mod tests;
