//! Last-resort synthetic derivation from a tokenized parse.
//!
//! The text is broken into numbers, strings, identifiers and operator
//! symbols; every token that carries meaning contributes one operation.
//! Because even a single recognizable token produces an instruction, this
//! strategy succeeds on any text the tokenizer can walk, which is what makes
//! it a safe last rung for the cascade.

use crate::extraction::pattern::SlotAllocator;
use crate::extraction::RawOp;
use crate::instruction::OpCode;
use crate::{Error, Result};

struct Tokenizer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    position: usize,
}

#[derive(Debug)]
enum Token<'a> {
    Number(i64),
    Str(usize),
    Ident(&'a str),
    Symbol(&'a str),
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            position: 0,
        }
    }

    fn next_token(&mut self) -> Result<Option<(Token<'a>, usize, usize)>> {
        self.skip_trivia();
        let start = self.position;
        let Some(&first) = self.bytes.get(self.position) else {
            return Ok(None);
        };

        if first.is_ascii_digit() {
            while self
                .bytes
                .get(self.position)
                .is_some_and(u8::is_ascii_digit)
            {
                self.position += 1;
            }
            let digits = &self.text[start..self.position];
            // Skip a trailing fraction; operands are integral
            if self.bytes.get(self.position) == Some(&b'.')
                && self.bytes.get(self.position + 1) != Some(&b'.')
            {
                self.position += 1;
                while self
                    .bytes
                    .get(self.position)
                    .is_some_and(u8::is_ascii_digit)
                {
                    self.position += 1;
                }
            }
            let value: i64 = digits
                .parse()
                .map_err(|_| malformed_error!("numeric literal out of range: {}", digits))?;
            return Ok(Some((Token::Number(value), start, self.position)));
        }

        if first == b'"' || first == b'\'' {
            self.position += 1;
            while self
                .bytes
                .get(self.position)
                .is_some_and(|&b| b != first && b != b'\n')
            {
                self.position += 1;
            }
            if self.bytes.get(self.position) == Some(&first) {
                self.position += 1;
            }
            let length = self.position - start;
            return Ok(Some((Token::Str(length), start, self.position)));
        }

        if first.is_ascii_alphabetic() || first == b'_' {
            while self
                .bytes
                .get(self.position)
                .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_')
            {
                self.position += 1;
            }
            return Ok(Some((
                Token::Ident(&self.text[start..self.position]),
                start,
                self.position,
            )));
        }

        // Two-character operators first
        for symbol in ["==", "~=", "<=", ">=", ".."] {
            if self.text[self.position..].starts_with(symbol) {
                self.position += 2;
                return Ok(Some((Token::Symbol(symbol), start, self.position)));
            }
        }
        // Advance by the character's encoded length; a multi-byte character
        // is one token, never a split byte
        let ch_len = self.text[self.position..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.position += ch_len;
        Ok(Some((
            Token::Symbol(&self.text[start..self.position]),
            start,
            self.position,
        )))
    }

    fn skip_trivia(&mut self) {
        loop {
            while self
                .bytes
                .get(self.position)
                .is_some_and(u8::is_ascii_whitespace)
            {
                self.position += 1;
            }
            if self.text[self.position..].starts_with("--") {
                while self
                    .bytes
                    .get(self.position)
                    .is_some_and(|&b| b != b'\n')
                {
                    self.position += 1;
                }
            } else {
                return;
            }
        }
    }
}

pub(crate) fn extract(text: &str, max_depth: usize) -> Result<Vec<RawOp>> {
    let mut tokenizer = Tokenizer::new(text);
    let mut slots = SlotAllocator::new();
    let mut ops = Vec::new();
    let mut depth = 0usize;

    while let Some((token, start, end)) = tokenizer.next_token()? {
        let op = match token {
            Token::Number(value) => {
                let dst = slots.fresh();
                Some(RawOp::new(OpCode::LoadK, vec![dst, value]))
            }
            Token::Str(length) => {
                let dst = slots.fresh();
                Some(RawOp::new(OpCode::LoadK, vec![dst, length as i64]))
            }
            Token::Ident(name) => match name {
                "if" | "elseif" | "while" | "for" => Some(RawOp::new(OpCode::JumpIf, vec![])),
                "do" | "then" | "function" | "repeat" => {
                    depth += 1;
                    if depth > max_depth {
                        return Err(Error::RecursionLimit(max_depth));
                    }
                    Some(RawOp::new(OpCode::EnterScope, vec![]))
                }
                "end" | "until" => {
                    depth = depth.saturating_sub(1);
                    Some(RawOp::new(OpCode::LeaveScope, vec![]))
                }
                "return" => Some(RawOp::new(OpCode::Return, vec![])),
                "break" => Some(RawOp::new(OpCode::Jump, vec![])),
                "true" => {
                    let dst = slots.fresh();
                    Some(RawOp::new(OpCode::LoadK, vec![dst, 1]))
                }
                "false" | "nil" => {
                    let dst = slots.fresh();
                    Some(RawOp::new(OpCode::LoadK, vec![dst, 0]))
                }
                "local" | "and" | "or" | "not" | "in" | "else" | "goto" => None,
                _ => {
                    let slot = slots.slot(name);
                    Some(RawOp::new(OpCode::LoadVar, vec![slot, slot]))
                }
            },
            Token::Symbol(symbol) => match symbol {
                "=" => Some(RawOp::new(OpCode::StoreVar, vec![])),
                "+" => Some(RawOp::new(OpCode::Add, vec![])),
                "-" => Some(RawOp::new(OpCode::Sub, vec![])),
                "*" => Some(RawOp::new(OpCode::Mul, vec![])),
                "/" => Some(RawOp::new(OpCode::Div, vec![])),
                ".." => Some(RawOp::new(OpCode::Concat, vec![])),
                "==" | "~=" | "<=" | ">=" | "<" | ">" => {
                    Some(RawOp::new(OpCode::Compare, vec![]))
                }
                "{" => {
                    let dst = slots.fresh();
                    Some(RawOp::new(OpCode::NewTable, vec![dst]))
                }
                "(" | ")" | "}" | "[" | "]" | "," | ";" | ":" | "." | "#" => None,
                _ => Some(RawOp::new(OpCode::Nop, vec![])),
            },
        };
        if let Some(op) = op {
            ops.push(op.with_span(start, end));
        }
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_comment_only_text() {
        assert!(extract("", 64).unwrap().is_empty());
        assert!(extract("-- just a comment\n", 64).unwrap().is_empty());
    }

    #[test]
    fn test_any_token_yields_an_instruction() {
        let ops = extract("@@ garbage @@", 64).unwrap();
        assert!(!ops.is_empty());
        // '@' is unknown, "garbage" is an identifier
        assert_eq!(ops[0].opcode, OpCode::Nop);
        assert!(ops.iter().any(|op| op.opcode == OpCode::LoadVar));
    }

    #[test]
    fn test_keyword_mapping() {
        let ops = extract("while x do return end", 64).unwrap();
        let opcodes: Vec<_> = ops.iter().map(|op| op.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                OpCode::JumpIf,
                OpCode::LoadVar,
                OpCode::EnterScope,
                OpCode::Return,
                OpCode::LeaveScope,
            ]
        );
    }

    #[test]
    fn test_literals_and_operators() {
        let ops = extract("x = 1 + 2", 64).unwrap();
        let opcodes: Vec<_> = ops.iter().map(|op| op.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                OpCode::LoadVar,
                OpCode::StoreVar,
                OpCode::LoadK,
                OpCode::Add,
                OpCode::LoadK,
            ]
        );
        assert_eq!(ops[2].operands[1], 1);
        assert_eq!(ops[4].operands[1], 2);
    }

    #[test]
    fn test_string_literal_loads_its_length() {
        let ops = extract("\"abc\"", 64).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].opcode, OpCode::LoadK);
        assert_eq!(ops[0].operands[1], 5);
    }

    #[test]
    fn test_overflowing_literal_fails_softly() {
        let result = extract("x = 99999999999999999999", 64);
        assert!(result.is_err());
    }

    #[test]
    fn test_depth_limit() {
        let text = "do do do do";
        assert!(matches!(
            extract(text, 2),
            Err(Error::RecursionLimit(2))
        ));
    }

    #[test]
    fn test_multibyte_characters_are_single_tokens() {
        let ops = extract("é = 1", 64).unwrap();
        let opcodes: Vec<_> = ops.iter().map(|op| op.opcode).collect();
        assert_eq!(opcodes, vec![OpCode::Nop, OpCode::StoreVar, OpCode::LoadK]);
        // The two-byte character is consumed whole
        assert_eq!(ops[0].span, Some((0, 2)));

        let ops = extract("λ ← 日本 \"héllo\"", 64).unwrap();
        assert!(!ops.is_empty());
        assert!(ops.iter().any(|op| op.opcode == OpCode::LoadK));
    }

    #[test]
    fn test_spans_are_attached() {
        let ops = extract("return", 64).unwrap();
        assert_eq!(ops[0].span, Some((0, 6)));
    }
}
