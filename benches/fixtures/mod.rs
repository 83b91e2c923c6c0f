// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

// Deterministic synthetic program images (no RNG).

use disview::engine::{Function, Instruction, Program, Section};
use disview::model::Address;

const BASE: u64 = 0x0010_0000;

fn instruction(address: u64, bytes: &str, text: String, target: Option<u64>) -> Instruction {
    Instruction {
        address: Address::new(address),
        bytes: bytes.to_owned(),
        text,
        target: target.map(Address::new),
        comment: None,
        description: None,
    }
}

/// `functions` functions of `body` instructions each; every eighth instruction calls the next
/// function and every fifth branches forward inside its own function.
pub fn wide_program(functions: usize, body: usize) -> Program {
    let stride = (body as u64 + 2) * 5;
    let mut out = Vec::with_capacity(functions);

    for index in 0..functions {
        let entry = BASE + index as u64 * stride;
        let next_entry = BASE + ((index + 1) % functions) as u64 * stride;
        let mut instructions = Vec::with_capacity(body + 1);
        instructions.push(instruction(entry, "55", "push rbp".to_owned(), None));

        let mut cursor = entry + 1;
        for step in 0..body {
            let next = if step % 8 == 7 {
                instruction(
                    cursor,
                    "e800000000",
                    format!("call 0x{next_entry:x}"),
                    Some(next_entry),
                )
            } else if step % 5 == 4 && step + 2 < body {
                let target = cursor + 10;
                instruction(cursor, "7508", format!("jne 0x{target:x}"), Some(target))
            } else {
                let text = format!("mov eax, dword [rbp - 0x{:x}]", step % 32);
                instruction(cursor, "8b45fc", text, None)
            };
            cursor += next.byte_len();
            instructions.push(next);
        }
        instructions.push(instruction(cursor, "c3", "ret".to_owned(), None));

        out.push(Function {
            name: format!("fcn.{index:05}"),
            decompiled: format!("void fcn_{index:05}(void) {{\n}}"),
            graph: String::new(),
            instructions,
        });
    }

    Program {
        name: format!("bench_{functions}x{body}"),
        entry: Some(Address::new(BASE)),
        sections: vec![Section {
            name: ".text".to_owned(),
            start: Address::new(BASE),
            size: functions as u64 * stride,
            perms: "r-x".to_owned(),
        }],
        functions: out,
    }
}
