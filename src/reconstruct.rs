//! Source reconstruction from a synthesized instruction sequence.
//!
//! The output is a readable *skeleton*, not runnable source: one line per
//! instruction from a fixed per-opcode template, with synthetic labels at
//! jump targets and indentation tracking scope instructions. Consumers treat
//! it as a display artifact and re-scan it independently.
//!
//! Reconstruction is two-pass. Pass 1 walks the sequence and assigns a fresh
//! `label_N` to every resolvable jump-target index, numbered in first-seen
//! order. Pass 2 linearizes: a target's label is emitted as a standalone line
//! immediately before the target instruction, scope-opening instructions
//! increment the indent level after emission and scope-closing ones decrement
//! it before emission, clamped at zero.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::instruction::{Instruction, OpCode};

const INDENT: &str = "    ";

/// Assigns labels to resolvable jump targets, first-seen order.
fn assign_labels(instructions: &[Instruction]) -> BTreeMap<usize, String> {
    let mut labels = BTreeMap::new();
    let mut next = 0usize;
    for instr in instructions {
        if let Some(target) = instr.jump_target(instructions.len()) {
            labels.entry(target).or_insert_with(|| {
                let label = format!("label_{next}");
                next += 1;
                label
            });
        }
    }
    labels
}

/// Renders one instruction from its per-opcode template.
fn render(instr: &Instruction, labels: &BTreeMap<usize, String>, sequence_len: usize) -> String {
    let ops = &instr.operands;
    let slot = |i: usize| ops.get(i).copied().unwrap_or(0);
    match instr.opcode {
        OpCode::LoadK => format!("local v{} = {}", slot(0), slot(1)),
        OpCode::LoadVar => format!("local v{} = v{}", slot(0), slot(1)),
        OpCode::StoreVar => format!("v{} = v{}", slot(0), slot(1)),
        OpCode::Add => format!("v{} = v{} + v{}", slot(0), slot(1), slot(2)),
        OpCode::Sub => format!("v{} = v{} - v{}", slot(0), slot(1), slot(2)),
        OpCode::Mul => format!("v{} = v{} * v{}", slot(0), slot(1), slot(2)),
        OpCode::Div => format!("v{} = v{} / v{}", slot(0), slot(1), slot(2)),
        OpCode::Concat => format!("v{} = v{} .. v{}", slot(0), slot(1), slot(2)),
        OpCode::Compare => format!("v{} = v{} == v{}", slot(0), slot(1), slot(2)),
        OpCode::NewTable => format!("local v{} = {{}}", slot(0)),
        OpCode::GetField => format!("local v{} = v{}[v{}]", slot(0), slot(1), slot(2)),
        OpCode::SetField => format!("v{}[v{}] = v{}", slot(0), slot(1), slot(2)),
        OpCode::Call => format!("local v{} = v{}(...) -- {} args", slot(0), slot(1), slot(2)),
        OpCode::Return => "return".to_string(),
        OpCode::Jump | OpCode::JumpIf => {
            let verb = if instr.opcode == OpCode::JumpIf {
                format!("if v{} then goto", slot(1))
            } else {
                "goto".to_string()
            };
            match instr
                .jump_target(sequence_len)
                .and_then(|target| labels.get(&target))
            {
                Some(label) => format!("{verb} {label}"),
                None => format!("{verb} <unresolved>"),
            }
        }
        OpCode::EnterScope => "do".to_string(),
        OpCode::LeaveScope => "end".to_string(),
        OpCode::Nop => "-- unrecognized".to_string(),
    }
}

/// Reconstructs readable source text from an instruction sequence.
///
/// An empty sequence reconstructs to an empty string. Jumps whose target
/// could not be resolved are emitted with an `<unresolved>` marker and
/// reported to `diagnostics`.
#[must_use]
pub fn reconstruct(instructions: &[Instruction], diagnostics: &Diagnostics) -> String {
    if instructions.is_empty() {
        return String::new();
    }
    let labels = assign_labels(instructions);
    let len = instructions.len();

    let mut out = String::new();
    let mut indent = 0usize;
    for (index, instr) in instructions.iter().enumerate() {
        if let Some(label) = labels.get(&index) {
            let _ = writeln!(out, "::{label}::");
        }
        if instr.opcode.closes_scope() {
            indent = indent.saturating_sub(1);
        }
        if instr.opcode.flow_type().is_branch() && instr.jump_target(len).is_none() {
            diagnostics.warning(
                DiagnosticCategory::Reconstruction,
                format!("jump at {:04X} has no resolvable label", instr.address),
            );
        }
        for _ in 0..indent {
            out.push_str(INDENT);
        }
        out.push_str(&render(instr, &labels, len));
        out.push('\n');
        if instr.opcode.opens_scope() {
            indent += 1;
        }
    }
    // Lines are joined with a single trailing newline removed
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(ops: &[(OpCode, Vec<i64>)]) -> Vec<Instruction> {
        ops.iter()
            .enumerate()
            .map(|(index, (opcode, operands))| {
                Instruction::new(*opcode, operands.clone(), index)
            })
            .collect()
    }

    #[test]
    fn test_empty_sequence_reconstructs_to_empty_string() {
        assert_eq!(reconstruct(&[], &Diagnostics::new()), "");
    }

    #[test]
    fn test_one_line_per_instruction() {
        let instructions = seq(&[
            (OpCode::LoadK, vec![0, 42]),
            (OpCode::LoadVar, vec![1, 0]),
            (OpCode::Return, vec![]),
        ]);
        let source = reconstruct(&instructions, &Diagnostics::new());
        let lines: Vec<_> = source.lines().collect();
        assert_eq!(
            lines,
            vec!["local v0 = 42", "local v1 = v0", "return"]
        );
    }

    #[test]
    fn test_labels_are_unique_and_first_seen_ordered() {
        // Two jumps to the same target share one label; a later jump to an
        // earlier address gets the next number
        let instructions = seq(&[
            (OpCode::Jump, vec![3]),
            (OpCode::Jump, vec![2]),
            (OpCode::Nop, vec![]),
            (OpCode::Jump, vec![-3]),
        ]);
        let source = reconstruct(&instructions, &Diagnostics::new());

        assert_eq!(source.matches("::label_0::").count(), 1);
        assert_eq!(source.matches("::label_1::").count(), 1);
        assert!(!source.contains("label_2"));
        // Both jumps to index 3 use label_0
        assert_eq!(source.matches("goto label_0").count(), 2);
    }

    #[test]
    fn test_scope_indentation() {
        let instructions = seq(&[
            (OpCode::EnterScope, vec![]),
            (OpCode::LoadK, vec![0, 1]),
            (OpCode::LeaveScope, vec![]),
        ]);
        let source = reconstruct(&instructions, &Diagnostics::new());
        let lines: Vec<_> = source.lines().collect();
        assert_eq!(lines, vec!["do", "    local v0 = 1", "end"]);
    }

    #[test]
    fn test_indent_clamps_at_zero() {
        let instructions = seq(&[
            (OpCode::LeaveScope, vec![]),
            (OpCode::LeaveScope, vec![]),
            (OpCode::Return, vec![]),
        ]);
        let source = reconstruct(&instructions, &Diagnostics::new());
        for line in source.lines() {
            assert!(!line.starts_with(' '));
        }
    }

    #[test]
    fn test_unresolved_jump_is_marked_and_reported() {
        let diagnostics = Diagnostics::new();
        let instructions = seq(&[(OpCode::Jump, vec![100]), (OpCode::Return, vec![])]);
        let source = reconstruct(&instructions, &diagnostics);

        assert!(source.contains("goto <unresolved>"));
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn test_conditional_jump_template() {
        let instructions = seq(&[
            (OpCode::JumpIf, vec![1, 5]),
            (OpCode::Return, vec![]),
        ]);
        let source = reconstruct(&instructions, &Diagnostics::new());
        assert!(source.contains("if v5 then goto label_0"));
        assert!(source.contains("::label_0::\nreturn"));
    }
}
