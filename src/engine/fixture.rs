// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory analysis engine over a serde-described program image.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{AnalysisEngine, EngineError};
use crate::model::{Address, FunctionRecord, RefDirection, RefEdge, RefKind};
use crate::viewport::parse_line_address;

/// Width of the raw-bytes column in rendered lines.
const BYTES_COLUMN: usize = 12;

const TARGET_PATTERN: &str = r"\b(?:call|j[a-z]{1,4})\s+(0[xX][0-9a-fA-F]+)";

fn target_pattern() -> Result<&'static Regex, EngineError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(TARGET_PATTERN))
        .as_ref()
        .map_err(|err| EngineError::Failure(format!("invalid target pattern: {err}")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Address>,
    #[serde(default)]
    pub sections: Vec<Section>,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub start: Address,
    pub size: u64,
    #[serde(default = "default_perms")]
    pub perms: String,
}

fn default_perms() -> String {
    "r-x".to_owned()
}

impl Section {
    pub fn contains(&self, address: Address) -> bool {
        address
            .offset_from(self.start)
            .is_some_and(|delta| delta < self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub decompiled: String,
    /// Simplified graph description; generated from the instructions when empty.
    #[serde(default)]
    pub graph: String,
    pub instructions: Vec<Instruction>,
}

impl Function {
    pub fn entry(&self) -> Option<Address> {
        self.instructions.first().map(|instr| instr.address)
    }

    /// One past the last byte of the last instruction.
    pub fn end(&self) -> Option<Address> {
        self.instructions
            .last()
            .and_then(|instr| instr.address.checked_add(instr.byte_len()))
    }

    pub fn size(&self) -> u64 {
        match (self.entry(), self.end()) {
            (Some(entry), Some(end)) => end.offset_from(entry).unwrap_or(0),
            _ => 0,
        }
    }

    pub fn contains(&self, address: Address) -> bool {
        match (self.entry(), self.end()) {
            (Some(entry), Some(end)) => entry <= address && address < end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub address: Address,
    #[serde(default)]
    pub bytes: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Instruction {
    /// Encoded length in bytes (two hex digits per byte, never zero).
    pub fn byte_len(&self) -> u64 {
        let digits = self
            .bytes
            .chars()
            .filter(|ch| ch.is_ascii_hexdigit())
            .count();
        (digits as u64 / 2).max(1)
    }

    pub fn mnemonic(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    fn is_jump(&self) -> bool {
        self.mnemonic().starts_with('j')
    }

    fn is_conditional_jump(&self) -> bool {
        self.is_jump() && self.mnemonic() != "jmp"
    }

    fn is_call(&self) -> bool {
        self.mnemonic() == "call"
    }

    fn is_exit(&self) -> bool {
        matches!(self.mnemonic(), "ret" | "retn" | "hlt")
    }

    fn ref_kind(&self) -> RefKind {
        if self.is_call() {
            RefKind::Call
        } else if self.is_jump() {
            RefKind::Jump
        } else {
            RefKind::Data
        }
    }
}

/// [`AnalysisEngine`] backed by a [`Program`] held in memory.
///
/// Rendered lines look like `0x00001000  55           push rbp  ; comment`, and a
/// `;-- name:` header precedes every function entry except the first line of a batch.
#[derive(Debug, Clone)]
pub struct FixtureEngine {
    program: Program,
    /// `(function, instruction)` positions sorted by address.
    index: Vec<(usize, usize)>,
    cursor: Address,
}

impl FixtureEngine {
    pub fn new(mut program: Program) -> Self {
        for function in &mut program.functions {
            function.instructions.sort_by_key(|instr| instr.address);
        }
        program
            .functions
            .retain(|function| !function.instructions.is_empty());
        program.functions.sort_by_key(|function| function.entry());

        let mut index = Vec::new();
        for (fidx, function) in program.functions.iter().enumerate() {
            for iidx in 0..function.instructions.len() {
                index.push((fidx, iidx));
            }
        }
        index.sort_by_key(|&(fidx, iidx)| program.functions[fidx].instructions[iidx].address);

        let cursor = program
            .entry
            .or_else(|| program.functions.first().and_then(Function::entry))
            .unwrap_or(Address::new(0));

        Self {
            program,
            index,
            cursor,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn cursor(&self) -> Address {
        self.cursor
    }

    fn instruction(&self, slot: (usize, usize)) -> &Instruction {
        &self.program.functions[slot.0].instructions[slot.1]
    }

    fn slot_at(&self, address: Address) -> Option<(usize, usize)> {
        self.index
            .binary_search_by_key(&address, |&slot| self.instruction(slot).address)
            .ok()
            .map(|pos| self.index[pos])
    }

    fn function_containing(&self, address: Address) -> Option<&Function> {
        self.program
            .functions
            .iter()
            .find(|function| function.contains(address))
    }

    fn function_named(&self, name: &str) -> Option<&Function> {
        self.program
            .functions
            .iter()
            .find(|function| function.name == name)
    }

    fn section_containing(&self, address: Address) -> Option<&Section> {
        self.program
            .sections
            .iter()
            .find(|section| section.contains(address))
    }

    fn in_image(&self, address: Address) -> bool {
        if !self.program.sections.is_empty() {
            return self.section_containing(address).is_some();
        }
        let first = self.index.first().map(|&slot| self.instruction(slot).address);
        let last = self.index.last().map(|&slot| self.instruction(slot));
        match (first, last) {
            (Some(first), Some(last)) => {
                let end = last.address.checked_add(last.byte_len()).unwrap_or(last.address);
                first <= address && address < end
            }
            _ => false,
        }
    }

    fn render_instruction(out: &mut String, instr: &Instruction) {
        let bytes: String = instr.bytes.split_whitespace().collect();
        let _ = write!(
            out,
            "{}  {:<width$} {}",
            instr.address,
            bytes,
            instr.text,
            width = BYTES_COLUMN
        );
        if let Some(comment) = instr.comment.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(out, "  ; {comment}");
        }
    }

    fn record_for(&self, function: &Function) -> Option<FunctionRecord> {
        let entry = function.entry()?;
        let record = FunctionRecord::new(function.name.as_str(), entry, function.size());
        Some(match self.section_containing(entry) {
            Some(section) => record.with_section(section.name.as_str()),
            None => record,
        })
    }

    fn generated_graph(function: &Function) -> String {
        let mut leaders = BTreeSet::new();
        if let Some(entry) = function.entry() {
            leaders.insert(entry);
        }
        for (pos, instr) in function.instructions.iter().enumerate() {
            if instr.is_jump() || instr.is_exit() {
                if let Some(next) = function.instructions.get(pos + 1) {
                    leaders.insert(next.address);
                }
            }
            if let Some(target) = instr.target.filter(|_| instr.is_jump()) {
                if function.contains(target) {
                    leaders.insert(target);
                }
            }
        }

        let block_of = |address: Address| leaders.range(..=address).next_back().copied();

        let mut out = format!("digraph \"{}\" {{\n", function.name);
        for leader in &leaders {
            let _ = writeln!(out, "  \"{leader}\";");
        }
        for (pos, instr) in function.instructions.iter().enumerate() {
            let Some(from) = block_of(instr.address) else {
                continue;
            };
            if instr.is_jump() {
                if let Some(to) = instr.target.filter(|t| function.contains(*t)) {
                    let _ = writeln!(out, "  \"{from}\" -> \"{to}\";");
                }
            }
            let falls_through = !instr.is_exit() && instr.mnemonic() != "jmp";
            if let Some(next) = function.instructions.get(pos + 1) {
                if falls_through && leaders.contains(&next.address) {
                    let _ = writeln!(out, "  \"{from}\" -> \"{}\";", next.address);
                }
            }
        }
        out.push('}');
        out
    }
}

impl AnalysisEngine for FixtureEngine {
    fn disassemble_batch(&mut self, count: usize) -> Result<String, EngineError> {
        let start = self
            .index
            .partition_point(|&slot| self.instruction(slot).address < self.cursor);

        let mut out = String::new();
        for (pos, &(fidx, iidx)) in self.index[start..].iter().take(count).enumerate() {
            if pos > 0 && iidx == 0 {
                let _ = writeln!(out, ";-- {}:", self.program.functions[fidx].name);
            }
            Self::render_instruction(&mut out, self.instruction((fidx, iidx)));
            out.push('\n');
        }
        Ok(out)
    }

    fn reposition_cursor(&mut self, address: Address) -> Result<(), EngineError> {
        if !self.in_image(address) {
            return Err(EngineError::OutOfRange(address));
        }
        self.cursor = address;
        Ok(())
    }

    fn function_name_at(&mut self, address: Address) -> Result<String, EngineError> {
        Ok(self
            .function_containing(address)
            .map(|function| function.name.clone())
            .unwrap_or_default())
    }

    fn function_at(&mut self, address: Address) -> Result<Option<FunctionRecord>, EngineError> {
        Ok(self
            .program
            .functions
            .iter()
            .find(|function| function.entry() == Some(address))
            .and_then(|function| self.record_for(function)))
    }

    fn decompile(&mut self, function_name: &str) -> Result<String, EngineError> {
        Ok(self
            .function_named(function_name)
            .map(|function| function.decompiled.clone())
            .unwrap_or_default())
    }

    fn cross_references(
        &mut self,
        address: Address,
        direction: RefDirection,
    ) -> Result<Vec<RefEdge>, EngineError> {
        let Some(focused) = self.function_containing(address) else {
            return Ok(Vec::new());
        };

        let mut edges = Vec::new();
        match direction {
            RefDirection::Outgoing => {
                for instr in &focused.instructions {
                    if let Some(target) = instr.target.filter(|t| !focused.contains(*t)) {
                        edges.push(RefEdge::new(instr.address, target, instr.ref_kind()));
                    }
                }
            }
            RefDirection::Incoming => {
                for function in &self.program.functions {
                    if std::ptr::eq(function, focused) {
                        continue;
                    }
                    for instr in &function.instructions {
                        if let Some(target) = instr.target.filter(|t| focused.contains(*t)) {
                            edges.push(RefEdge::new(instr.address, target, instr.ref_kind()));
                        }
                    }
                }
                edges.sort_by_key(RefEdge::from);
            }
        }
        Ok(edges)
    }

    fn disassemble_single(&mut self, address: Address) -> Result<String, EngineError> {
        let mut out = String::new();
        if let Some(slot) = self.slot_at(address) {
            Self::render_instruction(&mut out, self.instruction(slot));
        }
        Ok(out)
    }

    fn jump_target(&mut self, instruction_line: &str) -> Result<Option<Address>, EngineError> {
        if let Some(slot) = parse_line_address(instruction_line).and_then(|a| self.slot_at(a)) {
            let instr = self.instruction(slot);
            if instr.is_jump() || instr.is_call() {
                return Ok(instr.target);
            }
            return Ok(None);
        }

        let pattern = target_pattern()?;
        Ok(pattern
            .captures(instruction_line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<Address>().ok()))
    }

    fn offset_info(&mut self, address: Address) -> Result<String, EngineError> {
        let mut out = String::new();
        if let Some(section) = self.section_containing(address) {
            let _ = writeln!(out, "section: {}", section.name);
            let _ = writeln!(out, "perms: {}", section.perms);
        }
        if let Some(function) = self.function_containing(address) {
            let _ = writeln!(out, "function: {}", function.name);
            if let Some(delta) = function.entry().and_then(|entry| address.offset_from(entry)) {
                let _ = writeln!(out, "offset: {}+0x{delta:x}", function.name);
            }
        }
        if let Some(slot) = self.slot_at(address) {
            let _ = writeln!(out, "size: {}", self.instruction(slot).byte_len());
        }
        Ok(out)
    }

    fn opcode_description(&mut self, address: Address) -> Result<String, EngineError> {
        Ok(self
            .slot_at(address)
            .map(|slot| self.instruction(slot))
            .and_then(|instr| {
                instr
                    .description
                    .as_deref()
                    .map(|desc| format!("{}: {desc}", instr.mnemonic()))
            })
            .unwrap_or_default())
    }

    fn cyclomatic_complexity(&mut self, address: Address) -> Result<u64, EngineError> {
        Ok(self
            .function_containing(address)
            .map(|function| {
                let branches = function
                    .instructions
                    .iter()
                    .filter(|instr| instr.is_conditional_jump())
                    .count() as u64;
                branches + 1
            })
            .unwrap_or(0))
    }

    fn basic_block_count(&mut self, address: Address) -> Result<u64, EngineError> {
        Ok(self
            .function_containing(address)
            .map(|function| {
                let jumps = function
                    .instructions
                    .iter()
                    .filter(|instr| instr.is_jump())
                    .count() as u64;
                jumps + 1
            })
            .unwrap_or(0))
    }

    fn exit_block_count(&mut self, address: Address) -> Result<u64, EngineError> {
        Ok(self
            .function_containing(address)
            .map(|function| {
                function
                    .instructions
                    .iter()
                    .filter(|instr| instr.is_exit())
                    .count() as u64
            })
            .unwrap_or(0))
    }

    fn simplified_graph(&mut self, function_name: &str) -> Result<String, EngineError> {
        Ok(match self.function_named(function_name) {
            Some(function) if !function.graph.is_empty() => function.graph.clone(),
            Some(function) => Self::generated_graph(function),
            None => String::new(),
        })
    }

    fn entry_address(&self) -> Option<Address> {
        self.program
            .entry
            .or_else(|| self.program.functions.first().and_then(Function::entry))
    }

    fn functions(&self) -> Vec<FunctionRecord> {
        self.program
            .functions
            .iter()
            .filter_map(|function| self.record_for(function))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{FixtureEngine, Function, Instruction, Program, Section};
    use crate::engine::AnalysisEngine;
    use crate::model::{Address, RefDirection, RefKind};
    use crate::viewport::parse_line_address;

    fn instr(address: u64, bytes: &str, text: &str) -> Instruction {
        Instruction {
            address: Address::new(address),
            bytes: bytes.to_owned(),
            text: text.to_owned(),
            target: None,
            comment: None,
            description: None,
        }
    }

    fn branch(address: u64, bytes: &str, text: &str, target: u64) -> Instruction {
        Instruction {
            target: Some(Address::new(target)),
            ..instr(address, bytes, text)
        }
    }

    pub(crate) fn tiny_program() -> Program {
        let mut push = instr(0x1000, "55", "push rbp");
        push.description = Some("push word, doubleword or quadword onto the stack".to_owned());
        let mut call = branch(0x100c, "e8ef0f0000", "call 0x2000", 0x2000);
        call.comment = Some("helper".to_owned());

        Program {
            name: "tiny".to_owned(),
            entry: Some(Address::new(0x1000)),
            sections: vec![Section {
                name: ".text".to_owned(),
                start: Address::new(0x1000),
                size: 0x2000,
                perms: "r-x".to_owned(),
            }],
            functions: vec![
                Function {
                    name: "main".to_owned(),
                    decompiled: "int main(void) {\n    return helper();\n}".to_owned(),
                    graph: String::new(),
                    instructions: vec![
                        push,
                        instr(0x1001, "4889e5", "mov rbp, rsp"),
                        instr(0x1004, "83ff00", "cmp edi, 0"),
                        branch(0x1007, "7503", "jne 0x100c", 0x100c),
                        instr(0x1009, "31c0", "xor eax, eax"),
                        instr(0x100b, "c3", "ret"),
                        call,
                        instr(0x1011, "5d", "pop rbp"),
                        instr(0x1012, "c3", "ret"),
                    ],
                },
                Function {
                    name: "helper".to_owned(),
                    decompiled: String::new(),
                    graph: String::new(),
                    instructions: vec![
                        instr(0x2000, "b82a000000", "mov eax, 0x2a"),
                        instr(0x2005, "c3", "ret"),
                    ],
                },
            ],
        }
    }

    #[test]
    fn batch_starts_at_cursor_and_marks_function_entries() {
        let mut engine = FixtureEngine::new(tiny_program());
        engine.reposition_cursor(Address::new(0x1011)).expect("seek");
        let text = engine.disassemble_batch(10).expect("batch");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("0x00001011  5d"));
        assert_eq!(lines[2], ";-- helper:");
        assert_eq!(parse_line_address(lines[3]), Some(Address::new(0x2000)));
    }

    #[test]
    fn batch_counts_instructions_only() {
        let mut engine = FixtureEngine::new(tiny_program());
        engine.reposition_cursor(Address::new(0x100b)).expect("seek");
        let text = engine.disassemble_batch(3).expect("batch");
        let addresses: Vec<_> = text.lines().filter_map(parse_line_address).collect();
        assert_eq!(
            addresses,
            vec![Address::new(0x100b), Address::new(0x100c), Address::new(0x1011)]
        );
        assert!(text.contains("; helper"));
    }

    #[test]
    fn reposition_outside_image_is_rejected() {
        let mut engine = FixtureEngine::new(tiny_program());
        assert!(engine.reposition_cursor(Address::new(0x9000)).is_err());
        assert_eq!(engine.cursor(), Address::new(0x1000));
    }

    #[test]
    fn cross_references_split_by_direction() {
        let mut engine = FixtureEngine::new(tiny_program());
        let outgoing = engine
            .cross_references(Address::new(0x1004), RefDirection::Outgoing)
            .expect("out");
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to(), Address::new(0x2000));
        assert_eq!(outgoing[0].kind(), RefKind::Call);

        let incoming = engine
            .cross_references(Address::new(0x2005), RefDirection::Incoming)
            .expect("in");
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from(), Address::new(0x100c));

        let none = engine
            .cross_references(Address::new(0x1004), RefDirection::Incoming)
            .expect("in");
        assert!(none.is_empty());
    }

    #[test]
    fn metrics_follow_branch_structure() {
        let mut engine = FixtureEngine::new(tiny_program());
        let at = Address::new(0x1000);
        assert_eq!(engine.cyclomatic_complexity(at).expect("cc"), 2);
        assert_eq!(engine.basic_block_count(at).expect("bb"), 2);
        assert_eq!(engine.exit_block_count(at).expect("exits"), 2);
        assert_eq!(engine.cyclomatic_complexity(Address::new(0x5000)).expect("cc"), 0);
    }

    #[test]
    fn jump_target_prefers_instruction_table() {
        let mut engine = FixtureEngine::new(tiny_program());
        let line = engine.disassemble_single(Address::new(0x1007)).expect("line");
        assert_eq!(engine.jump_target(&line).expect("target"), Some(Address::new(0x100c)));

        let plain = engine.disassemble_single(Address::new(0x1001)).expect("line");
        assert_eq!(engine.jump_target(&plain).expect("target"), None);

        assert_eq!(
            engine.jump_target("call 0x2000").expect("target"),
            Some(Address::new(0x2000))
        );
    }

    #[test]
    fn offset_info_and_opcode_description() {
        let mut engine = FixtureEngine::new(tiny_program());
        let info = engine.offset_info(Address::new(0x1004)).expect("info");
        assert!(info.contains("section: .text"));
        assert!(info.contains("offset: main+0x4"));
        assert_eq!(
            engine.opcode_description(Address::new(0x1000)).expect("desc"),
            "push: push word, doubleword or quadword onto the stack"
        );
        assert_eq!(engine.opcode_description(Address::new(0x1001)).expect("desc"), "");
    }

    #[test]
    fn function_lookup_by_entry_and_name() {
        let mut engine = FixtureEngine::new(tiny_program());
        let record = engine
            .function_at(Address::new(0x2000))
            .expect("query")
            .expect("record");
        assert_eq!(record.qualified_name(), ".text:helper");
        assert!(engine.function_at(Address::new(0x2005)).expect("query").is_none());
        assert_eq!(engine.function_name_at(Address::new(0x1012)).expect("name"), "main");
        assert_eq!(engine.function_name_at(Address::new(0x1013)).expect("name"), "");
        assert_eq!(engine.functions().len(), 2);
    }

    #[test]
    fn generated_graph_links_blocks() {
        let mut engine = FixtureEngine::new(tiny_program());
        let graph = engine.simplified_graph("main").expect("graph");
        assert!(graph.starts_with("digraph \"main\""));
        assert!(graph.contains("\"0x00001000\" -> \"0x0000100c\";"));
        assert!(graph.contains("\"0x00001000\" -> \"0x00001009\";"));
        assert_eq!(engine.simplified_graph("missing").expect("graph"), "");
    }
}
