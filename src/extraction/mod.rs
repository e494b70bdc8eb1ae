//! The ordered, memoized extraction cascade and its synthesis strategies.
//!
//! Given an opaque script object, the cascade tries several independent
//! strategies in fixed priority order and stops at the first one that both
//! completes without error and returns a nonempty instruction sequence:
//!
//! 1. [`Strategy::PatternTag`] - structural pattern tagging over readable text
//! 2. [`Strategy::TraceSample`] - execution-trace sampling through the
//!    injected reflection host
//! 3. [`Strategy::SignatureScan`] - scanning for known opcode-sequence
//!    fragments
//! 4. [`Strategy::Tokenize`] - full synthetic derivation from a tokenized
//!    parse of the text
//!
//! A strategy that errors is a *soft* failure: the cascade records a
//! diagnostic and tries the next one. All strategies exhausted is reported as
//! "no instructions available", never as an error. Outcomes (including total
//! failures) are memoized by a SHA-1 hash of the script text, so a repeated
//! call with identical text returns the cached sequence without re-running
//! any strategy.

mod cache;
mod cascade;
mod pattern;
mod signature;
mod tokenize;
mod trace;

pub use cache::{content_hash, AnalysisCache, ContentHash, ExtractionOutcome};
pub use cascade::{ExtractionCascade, Strategy};

use crate::instruction::{Instruction, OpCode, META_SPAN, META_STRATEGY};

/// An opcode/operand pair produced by a strategy before sealing.
///
/// Strategies work in terms of raw operations; the cascade seals them into
/// [`Instruction`]s, which assigns the gap-free index-based addresses the
/// graph builder depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawOp {
    pub opcode: OpCode,
    pub operands: Vec<i64>,
    /// Byte span of the source text this op was synthesized from, when known.
    pub span: Option<(usize, usize)>,
}

impl RawOp {
    pub(crate) fn new(opcode: OpCode, operands: Vec<i64>) -> Self {
        Self {
            opcode,
            operands,
            span: None,
        }
    }

    pub(crate) fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }
}

/// Seals raw operations into an immutable instruction sequence.
///
/// Addresses are assigned sequentially from 0 with the fixed stride, and each
/// instruction's metadata records the producing strategy and source span.
pub(crate) fn seal(ops: Vec<RawOp>, strategy: Strategy) -> Vec<Instruction> {
    ops.into_iter()
        .enumerate()
        .map(|(index, op)| {
            let mut instr = Instruction::new(op.opcode, op.operands, index)
                .with_metadata(META_STRATEGY, strategy.to_string());
            if let Some((start, end)) = op.span {
                instr = instr.with_metadata(META_SPAN, format!("{start}..{end}"));
            }
            instr
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::INSTRUCTION_STRIDE;

    #[test]
    fn test_seal_assigns_contiguous_addresses() {
        let ops = vec![
            RawOp::new(OpCode::LoadK, vec![0, 1]).with_span(0, 11),
            RawOp::new(OpCode::Return, vec![]),
        ];
        let sealed = seal(ops, Strategy::PatternTag);

        assert_eq!(sealed.len(), 2);
        assert_eq!(sealed[0].address, 0);
        assert_eq!(sealed[1].address, INSTRUCTION_STRIDE);
        assert_eq!(
            sealed[0].metadata.get(META_STRATEGY).map(String::as_str),
            Some("PatternTag")
        );
        assert_eq!(
            sealed[0].metadata.get(META_SPAN).map(String::as_str),
            Some("0..11")
        );
        assert!(!sealed[1].metadata.contains_key(META_SPAN));
    }
}
