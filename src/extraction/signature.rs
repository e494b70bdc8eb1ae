//! Signature scanning for known textual fragments.
//!
//! A small built-in table maps characteristic substrings to short opcode
//! fragments. The scanner collects every occurrence of every signature,
//! orders the matches by text position (table order breaks ties at the same
//! position), and concatenates the fragments. It is cruder than pattern
//! tagging but tolerates text mangled enough that line structure is gone.

use crate::extraction::RawOp;
use crate::instruction::OpCode;

/// Characteristic substrings and the opcode fragments they imply.
///
/// Longer, more specific signatures come first so that a tie at the same
/// match position resolves toward the more informative fragment.
const SIGNATURES: &[(&str, &[OpCode])] = &[
    (
        "while true do",
        &[OpCode::LoadK, OpCode::JumpIf, OpCode::EnterScope],
    ),
    (
        "setmetatable(",
        &[OpCode::LoadVar, OpCode::LoadVar, OpCode::Call],
    ),
    ("table.insert(", &[OpCode::GetField, OpCode::Call]),
    ("string.", &[OpCode::GetField]),
    ("getfenv(", &[OpCode::Call]),
    ("setfenv(", &[OpCode::Call]),
    ("pcall(", &[OpCode::LoadVar, OpCode::Call]),
    ("print(", &[OpCode::LoadVar, OpCode::Call]),
    ("function", &[OpCode::EnterScope]),
    ("return", &[OpCode::Return]),
    ("end", &[OpCode::LeaveScope]),
];

pub(crate) fn extract(text: &str) -> Vec<RawOp> {
    let mut matches: Vec<(usize, usize)> = Vec::new();
    for (table_index, (needle, _)) in SIGNATURES.iter().enumerate() {
        for (position, _) in text.match_indices(needle) {
            matches.push((position, table_index));
        }
    }
    matches.sort_unstable();

    let mut ops = Vec::new();
    for (position, table_index) in matches {
        let (needle, fragment) = SIGNATURES[table_index];
        for &opcode in fragment {
            ops.push(RawOp::new(opcode, vec![]).with_span(position, position + needle.len()));
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_signatures_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("@@ garbage @@").is_empty());
    }

    #[test]
    fn test_fragments_in_text_order() {
        let ops = extract("function f() print(1) end return");
        let opcodes: Vec<_> = ops.iter().map(|op| op.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                OpCode::EnterScope,
                OpCode::LoadVar,
                OpCode::Call,
                OpCode::LeaveScope,
                OpCode::Return,
            ]
        );
    }

    #[test]
    fn test_spans_cover_the_match() {
        let ops = extract("return");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].span, Some((0, 6)));
    }

    #[test]
    fn test_repeated_signatures_all_match() {
        let ops = extract("end end end");
        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(|op| op.opcode == OpCode::LeaveScope));
    }

    #[test]
    fn test_determinism() {
        let text = "while true do pcall(f) end";
        assert_eq!(extract(text), extract(text));
    }
}
