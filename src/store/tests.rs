// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{load_program, save_program, validate_program, StoreError};
use crate::engine::fixture::tests::tiny_program;
use crate::engine::{demo_program, Instruction};
use crate::model::Address;

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("disview-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[fixture]
fn tmp() -> TempDir {
    TempDir::new("store")
}

#[rstest]
fn save_then_load_preserves_program(tmp: TempDir) {
    let path = tmp.path().join("nested").join("tiny.json");
    let program = tiny_program();
    save_program(&path, &program).expect("save");
    let loaded = load_program(&path).expect("load");
    assert_eq!(loaded, program);

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(".disview.tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[rstest]
fn load_reports_missing_file(tmp: TempDir) {
    let err = load_program(&tmp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }));
}

#[rstest]
fn load_reports_malformed_json(tmp: TempDir) {
    let path = tmp.path().join("broken.json");
    std::fs::write(&path, "{ \"name\": ").unwrap();
    let err = load_program(&path).unwrap_err();
    assert!(matches!(err, StoreError::Json { .. }));
}

#[rstest]
fn load_rejects_overlapping_functions(tmp: TempDir) {
    let mut program = tiny_program();
    program.functions[1].instructions[0].address = Address::new(0x1010);
    program.functions[1].instructions[1].address = Address::new(0x1015);
    let path = tmp.path().join("overlap.json");
    std::fs::write(&path, serde_json::to_string(&program).unwrap()).unwrap();

    let err = load_program(&path).unwrap_err();
    let StoreError::Invalid { reason, .. } = err else {
        panic!("expected invalid program, got {err:?}");
    };
    assert!(reason.contains("overlap"), "{reason}");
}

#[test]
fn validation_rejects_entry_outside_functions() {
    let mut program = tiny_program();
    program.entry = Some(Address::new(0x3000));
    assert!(validate_program(&program).unwrap_err().contains("entry"));
}

#[test]
fn validation_rejects_overlapping_instructions() {
    let mut program = tiny_program();
    program.functions[0].instructions.insert(
        1,
        Instruction {
            address: Address::new(0x1000),
            bytes: "90".to_owned(),
            text: "nop".to_owned(),
            target: None,
            comment: None,
            description: None,
        },
    );
    assert!(validate_program(&program).is_err());
}

#[test]
fn demo_program_is_valid() {
    validate_program(&demo_program()).expect("demo program validates");
}

#[test]
fn hex_string_addresses_are_accepted_in_json() {
    let json = r#"{
        "name": "mini",
        "entry": "0x400",
        "functions": [
            { "name": "f", "instructions": [
                { "address": "0x400", "bytes": "c3", "text": "ret" }
            ] }
        ]
    }"#;
    let program: crate::engine::Program = serde_json::from_str(json).expect("parse");
    assert_eq!(program.entry, Some(Address::new(0x400)));
    validate_program(&program).expect("valid");
}
