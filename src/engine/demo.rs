// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in program image used when no program file is given.

use crate::model::Address;

use super::fixture::{Function, Instruction, Program, Section};

const TEXT_BASE: u64 = 0x0040_1000;
const FUNCTION_STRIDE: u64 = 0x200;

const FUNCTION_NAMES: [&str; 12] = [
    "entry0",
    "main",
    "parse_args",
    "init_state",
    "read_input",
    "checksum",
    "decode_block",
    "emit_record",
    "flush_output",
    "cleanup",
    "sym.imp.puts",
    "sym.imp.malloc",
];

/// Body shapes cycled through to give every function a different size and branch structure.
#[derive(Debug, Clone, Copy)]
enum Op {
    Load,
    Add,
    Compare,
    Branch,
    Call,
    Lea,
    Store,
}

const BODY: [Op; 9] = [
    Op::Load,
    Op::Add,
    Op::Compare,
    Op::Branch,
    Op::Lea,
    Op::Call,
    Op::Store,
    Op::Load,
    Op::Compare,
];

fn description(mnemonic: &str) -> Option<&'static str> {
    Some(match mnemonic {
        "push" => "push word, doubleword or quadword onto the stack",
        "mov" => "moves data from src to dst",
        "sub" => "subtract src and dst, stores the result on dst",
        "add" => "adds src and dst, stores the result on dst",
        "cmp" => "compare two operands",
        "jne" => "jump short if not equal (ZF=0)",
        "je" => "jump short if equal (ZF=1)",
        "jmp" => "jump",
        "call" => "calling a procedure",
        "lea" => "load effective address",
        "leave" => "high level procedure exit",
        "ret" => "return from procedure",
        _ => return None,
    })
}

struct Draft {
    bytes: &'static str,
    text: String,
    /// Index of the instruction (inside the same function) a branch lands on.
    local_target: Option<usize>,
    callee: Option<usize>,
    comment: Option<String>,
}

fn draft(bytes: &'static str, text: impl Into<String>) -> Draft {
    Draft {
        bytes,
        text: text.into(),
        local_target: None,
        callee: None,
        comment: None,
    }
}

fn function_drafts(index: usize) -> Vec<Draft> {
    let count = FUNCTION_NAMES.len();
    let mut drafts = vec![
        draft("55", "push rbp"),
        draft("4889e5", "mov rbp, rsp"),
        draft("4883ec20", format!("sub rsp, 0x{:x}", 0x10 + (index % 4) * 0x8)),
    ];

    let body_len = 12 + (index * 7) % 29;
    for step in 0..body_len {
        let slot = (step + index) % 10;
        let var = 4 + (step % 6) * 4;
        let next = match BODY.get(slot).copied().unwrap_or(Op::Store) {
            Op::Load => draft("8b45fc", format!("mov eax, dword [rbp - 0x{var:x}]")),
            Op::Add => draft("83c001", format!("add eax, 0x{:x}", step % 5 + 1)),
            Op::Compare => draft("3d00010000", format!("cmp eax, 0x{:x}", 0x100 + step)),
            Op::Branch => {
                let mnemonic = if step % 3 == 0 { "je" } else { "jne" };
                let mut branch = draft("7506", mnemonic);
                branch.local_target = Some(drafts.len() + 3);
                branch
            }
            Op::Call => {
                let mut call = draft("e800000000", "call");
                let callee = (index + 1 + step % 3) % count;
                call.callee = Some(if callee == index {
                    (callee + 1) % count
                } else {
                    callee
                });
                call
            }
            Op::Lea => draft("488d45f0", format!("lea rax, [rbp - 0x{var:x}]")),
            Op::Store => {
                let mut store = draft("8945fc", format!("mov dword [rbp - 0x{var:x}], eax"));
                if step % 4 == 0 {
                    store.comment = Some(format!("var_{var:x}h"));
                }
                store
            }
        };
        drafts.push(next);
    }

    drafts.push(draft("c9", "leave"));
    drafts.push(draft("c3", "ret"));
    drafts
}

fn byte_len(bytes: &str) -> u64 {
    (bytes.len() as u64 / 2).max(1)
}

fn decompiled_body(name: &str, callees: &[&str]) -> String {
    if name.starts_with("sym.imp.") {
        return String::new();
    }
    let mut out = format!("int32_t {name}(int64_t arg1)\n{{\n    int32_t var_4h;\n\n");
    out.push_str("    var_4h = (int32_t)arg1;\n");
    for callee in callees {
        out.push_str(&format!("    if (var_4h != 0) {{\n        {callee}(var_4h);\n    }}\n"));
    }
    out.push_str("    return var_4h;\n}");
    out
}

/// A deterministic twelve-function program with calls between functions and local branches.
pub fn demo_program() -> Program {
    let entries: Vec<Address> = (0..FUNCTION_NAMES.len() as u64)
        .map(|idx| Address::new(TEXT_BASE + idx * FUNCTION_STRIDE))
        .collect();

    let mut functions = Vec::with_capacity(FUNCTION_NAMES.len());
    for (index, name) in FUNCTION_NAMES.iter().enumerate() {
        let drafts = function_drafts(index);

        let mut addresses = Vec::with_capacity(drafts.len());
        let mut cursor = entries[index].value();
        for draft in &drafts {
            addresses.push(Address::new(cursor));
            cursor += byte_len(draft.bytes);
        }

        let mut callees = Vec::new();
        let instructions = drafts
            .into_iter()
            .enumerate()
            .map(|(pos, draft)| {
                let local = draft
                    .local_target
                    .map(|target| addresses[target.min(addresses.len() - 1)]);
                let call = draft.callee.map(|callee| entries[callee]);
                let target = local.or(call);
                if let Some(callee) = draft.callee {
                    callees.push(FUNCTION_NAMES[callee]);
                }
                let text = match target {
                    Some(target) => format!("{} 0x{:x}", draft.text, target.value()),
                    None => draft.text,
                };
                let mnemonic = text.split_whitespace().next().unwrap_or("");
                Instruction {
                    address: addresses[pos],
                    bytes: draft.bytes.to_owned(),
                    description: description(mnemonic).map(str::to_owned),
                    text,
                    target,
                    comment: draft
                        .comment
                        .or_else(|| draft.callee.map(|callee| FUNCTION_NAMES[callee].to_owned())),
                }
            })
            .collect();

        callees.dedup();
        functions.push(Function {
            name: (*name).to_owned(),
            decompiled: decompiled_body(name, &callees),
            graph: String::new(),
            instructions,
        });
    }

    Program {
        name: "demo".to_owned(),
        entry: entries.first().copied(),
        sections: vec![Section {
            name: ".text".to_owned(),
            start: Address::new(TEXT_BASE),
            size: FUNCTION_STRIDE * FUNCTION_NAMES.len() as u64,
            perms: "r-x".to_owned(),
        }],
        functions,
    }
}

#[cfg(test)]
mod tests {
    use super::{demo_program, FUNCTION_STRIDE};
    use crate::engine::{AnalysisEngine, FixtureEngine};
    use crate::model::RefDirection;

    #[test]
    fn functions_fit_their_stride_and_do_not_overlap() {
        let program = demo_program();
        for function in &program.functions {
            assert!(function.size() < FUNCTION_STRIDE, "{} too large", function.name);
        }
        for pair in program.functions.windows(2) {
            assert!(pair[0].end() <= pair[1].entry());
        }
    }

    #[test]
    fn demo_has_cross_references_both_ways() {
        let mut engine = FixtureEngine::new(demo_program());
        let main = engine
            .functions()
            .into_iter()
            .find(|record| record.name() == "main")
            .expect("main");
        let outgoing = engine
            .cross_references(main.entry(), RefDirection::Outgoing)
            .expect("out");
        let incoming = engine
            .cross_references(main.entry(), RefDirection::Incoming)
            .expect("in");
        assert!(!outgoing.is_empty());
        assert!(!incoming.is_empty());
    }

    #[test]
    fn imports_have_no_decompiled_body() {
        let program = demo_program();
        let puts = program
            .functions
            .iter()
            .find(|function| function.name == "sym.imp.puts")
            .expect("puts");
        assert!(puts.decompiled.is_empty());
    }
}
