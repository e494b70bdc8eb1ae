//! Structural pattern tagging over readable script text.
//!
//! The highest-priority strategy: walk the text line by line and tag each line
//! with the opcode its surface structure suggests. Assignments become loads or
//! arithmetic, call-shaped lines become calls, control keywords become jumps
//! and scope markers. Lines that match nothing become no-op placeholders so
//! the address space stays contiguous.
//!
//! The strategy declares failure (empty result) when *no* line matched a
//! recognizable pattern; a wall of placeholders is evidence the text is not
//! actually readable source and a later strategy should have its turn.

use std::collections::HashMap;

use crate::extraction::RawOp;
use crate::instruction::OpCode;
use crate::{Error, Result};

/// Keywords that never name user values.
const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Maps identifier names to stable numeric slot ids, first-seen order.
#[derive(Debug, Default)]
pub(crate) struct SlotAllocator {
    slots: HashMap<String, i64>,
    next: i64,
}

impl SlotAllocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the slot id for a name, allocating on first sight.
    pub(crate) fn slot(&mut self, name: &str) -> i64 {
        if let Some(&id) = self.slots.get(name) {
            return id;
        }
        let id = self.next;
        self.next += 1;
        self.slots.insert(name.to_string(), id);
        id
    }

    /// Allocates an anonymous temporary slot.
    pub(crate) fn fresh(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Extracts signed numeric literals appearing in a text fragment.
///
/// A literal that overflows the operand range makes the whole strategy fail
/// softly rather than silently mis-tagging.
pub(crate) fn numeric_literals(fragment: &str) -> Result<Vec<i64>> {
    let mut literals = Vec::new();
    let bytes = fragment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            // Skip fractional parts; operands are integral
            if i < bytes.len() && bytes[i] == b'.' {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let digits = fragment[start..i].split('.').next().unwrap_or("");
            let value: i64 = digits
                .parse()
                .map_err(|_| malformed_error!("numeric literal out of range: {}", digits))?;
            // Negative sign directly preceding the digits
            let negative = start > 0 && bytes[start - 1] == b'-' && {
                let before = fragment[..start - 1].trim_end();
                before.is_empty() || !before.ends_with(|c: char| c.is_alphanumeric() || c == ')')
            };
            literals.push(if negative { -value } else { value });
        } else {
            i += 1;
        }
    }
    Ok(literals)
}

/// Extracts identifier names (keywords excluded) from a text fragment.
pub(crate) fn identifiers(fragment: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let bytes = fragment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            let name = &fragment[start..i];
            if !KEYWORDS.contains(&name) {
                names.push(name);
            }
        } else {
            i += 1;
        }
    }
    names
}

/// Finds the position of a plain assignment `=`, ignoring comparison operators.
fn assignment_position(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1);
        if prev != Some(b'=')
            && prev != Some(b'~')
            && prev != Some(b'<')
            && prev != Some(b'>')
            && next != Some(&b'=')
        {
            return Some(i);
        }
    }
    None
}

/// Tags an assignment's right-hand side with the opcode its shape suggests.
fn tag_assignment(
    dst: i64,
    lhs: &str,
    rhs: &str,
    slots: &mut SlotAllocator,
) -> Result<(OpCode, Vec<i64>)> {
    let rhs = rhs.trim();
    let literals = numeric_literals(rhs)?;

    if lhs.contains('.') || lhs.contains('[') {
        let mut operands = vec![dst];
        operands.extend(literals.iter().take(2));
        return Ok((OpCode::SetField, operands));
    }
    if let Ok(value) = rhs.parse::<i64>() {
        return Ok((OpCode::LoadK, vec![dst, value]));
    }
    if rhs.starts_with('{') {
        return Ok((OpCode::NewTable, vec![dst]));
    }
    if rhs.contains('(') {
        let callee = identifiers(rhs).first().map_or(0, |name| slots.slot(name));
        return Ok((OpCode::Call, vec![dst, callee, literals.len() as i64]));
    }

    let arithmetic = [
        ("..", OpCode::Concat),
        ("==", OpCode::Compare),
        ("~=", OpCode::Compare),
        ("+", OpCode::Add),
        ("-", OpCode::Sub),
        ("*", OpCode::Mul),
        ("/", OpCode::Div),
    ];
    for (symbol, opcode) in arithmetic {
        if rhs.contains(symbol) {
            let mut operands = vec![dst];
            for name in identifiers(rhs).iter().take(2) {
                operands.push(slots.slot(name));
            }
            if operands.len() < 3 {
                operands.extend(literals.iter().take(3 - operands.len()));
            }
            return Ok((opcode, operands));
        }
    }
    if rhs.contains('.') || rhs.contains('[') {
        let base = identifiers(rhs).first().map_or(0, |name| slots.slot(name));
        return Ok((OpCode::GetField, vec![dst, base, 0]));
    }
    if let Some(name) = identifiers(rhs).first() {
        let src = slots.slot(name);
        return Ok((OpCode::LoadVar, vec![dst, src]));
    }
    // String literals and everything else load as constants
    Ok((OpCode::LoadK, vec![dst, *literals.first().unwrap_or(&0)]))
}

/// Runs the pattern-tagging strategy over the full text.
pub(crate) fn extract(text: &str, max_depth: usize) -> Result<Vec<RawOp>> {
    let mut ops = Vec::new();
    let mut slots = SlotAllocator::new();
    let mut depth = 0usize;
    let mut recognized = false;
    let mut offset = 0usize;

    for raw_line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let span = (line_start, line_start + raw_line.trim_end().len());
        let literals = numeric_literals(line)?;

        if line == "return" || line.starts_with("return ") {
            ops.push(RawOp::new(OpCode::Return, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line == "end"
            || line.starts_with("end ")
            || line == "until"
            || line.starts_with("until ")
        {
            depth = depth.saturating_sub(1);
            ops.push(RawOp::new(OpCode::LeaveScope, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line.starts_with("elseif") {
            ops.push(RawOp::new(OpCode::LeaveScope, vec![]).with_span(span.0, span.1));
            ops.push(RawOp::new(OpCode::JumpIf, literals.clone()).with_span(span.0, span.1));
            ops.push(RawOp::new(OpCode::EnterScope, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line == "else" {
            ops.push(RawOp::new(OpCode::LeaveScope, vec![]).with_span(span.0, span.1));
            ops.push(RawOp::new(OpCode::EnterScope, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line == "function"
            || line.starts_with("function ")
            || line == "do"
            || line.starts_with("do ")
        {
            depth += 1;
            if depth > max_depth {
                return Err(Error::RecursionLimit(max_depth));
            }
            ops.push(RawOp::new(OpCode::EnterScope, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line.starts_with("if ") {
            ops.push(RawOp::new(OpCode::JumpIf, literals.clone()).with_span(span.0, span.1));
            if line.contains("then") {
                depth += 1;
                if depth > max_depth {
                    return Err(Error::RecursionLimit(max_depth));
                }
                ops.push(RawOp::new(OpCode::EnterScope, vec![]).with_span(span.0, span.1));
            }
            recognized = true;
        } else if line.starts_with("while ") || line.starts_with("for ") || line == "repeat" {
            depth += 1;
            if depth > max_depth {
                return Err(Error::RecursionLimit(max_depth));
            }
            ops.push(RawOp::new(OpCode::JumpIf, literals.clone()).with_span(span.0, span.1));
            ops.push(RawOp::new(OpCode::EnterScope, vec![]).with_span(span.0, span.1));
            recognized = true;
        } else if line == "break" {
            ops.push(RawOp::new(OpCode::Jump, literals.clone()).with_span(span.0, span.1));
            recognized = true;
        } else if let Some(eq) = assignment_position(line) {
            let lhs = line[..eq].trim().trim_start_matches("local ").trim();
            let rhs = &line[eq + 1..];
            let dst = match identifiers(lhs).last() {
                Some(name) => slots.slot(name),
                None => slots.fresh(),
            };
            let (opcode, operands) = tag_assignment(dst, lhs, rhs, &mut slots)?;
            ops.push(RawOp::new(opcode, operands).with_span(span.0, span.1));
            recognized = true;
        } else if line.contains('(') {
            let dst = slots.fresh();
            let callee = identifiers(line).first().map_or(0, |name| slots.slot(name));
            ops.push(
                RawOp::new(OpCode::Call, vec![dst, callee, literals.len() as i64])
                    .with_span(span.0, span.1),
            );
            recognized = true;
        } else {
            ops.push(RawOp::new(OpCode::Nop, vec![]).with_span(span.0, span.1));
        }
    }

    if recognized {
        Ok(ops)
    } else {
        Ok(Vec::new())
    }
}
