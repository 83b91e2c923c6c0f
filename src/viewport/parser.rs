// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Address, HEX_MARKER};

const COMMENT_MARKER: char = ';';

/// Extracts the address a rendered disassembly line starts with.
///
/// Leading decoration tokens (anything without a letter or digit, such as box-drawing
/// characters) are skipped. The first remaining token must contain `0x`; the hex digits right
/// after the marker are the address and anything after them (`:`, `,`) is ignored. Blank lines,
/// `;` comment lines, tokens without digits and values wider than 64 bits all yield `None`.
/// A miss is never an error.
pub fn parse_line_address(line: &str) -> Option<Address> {
    if line.trim_start().starts_with(COMMENT_MARKER) {
        return None;
    }

    let token = line
        .split_whitespace()
        .find(|token| token.chars().any(char::is_alphanumeric))?;
    let marker = token.find(HEX_MARKER)?;
    let rest = &token[marker + HEX_MARKER.len()..];
    let end = rest
        .find(|ch: char| !ch.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    u64::from_str_radix(&rest[..end], 16)
        .ok()
        .map(Address::new)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::parse_line_address;
    use crate::model::Address;

    #[rstest]
    #[case("0x00001000  55           push rbp", Some(0x1000))]
    #[case("   0x00401a2c      mov eax, 1", Some(0x0040_1a2c))]
    #[case("│ 0x00001100:  call 0x2000", Some(0x1100))]
    #[case("0x1f,", Some(0x1f))]
    #[case("0xffffffffffffffff  ud2", Some(u64::MAX))]
    #[case("", None)]
    #[case("      ", None)]
    #[case(";-- main:", None)]
    #[case("  ; CALL XREF from 0x00001010", None)]
    #[case("push rbp", None)]
    #[case("main: 0x1000", None)]
    #[case("0x  nop", None)]
    #[case("0xzz", None)]
    #[case("0x1ffffffffffffffff  overflow", None)]
    fn parses_leading_address_token(#[case] line: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_line_address(line), expected.map(Address::new));
    }

    #[test]
    fn rendered_address_parses_back_to_same_value() {
        for value in [0u64, 0x10, 0x1000, 0x0040_1000, 0x1_4000_0000, u64::MAX] {
            let address = Address::new(value);
            let line = format!("{address}  90           nop");
            assert_eq!(parse_line_address(&line), Some(address));
        }
    }
}
