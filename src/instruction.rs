//! The symbolic instruction model produced by the extraction cascade.
//!
//! Instructions here are *synthesized*, not decoded: each extraction strategy maps
//! textual or structural evidence onto a fixed opcode table and assigns sequential
//! addresses with a fixed stride. The model therefore guarantees properties the
//! downstream graph builder depends on (address continuity, fixed per-opcode
//! operand arity) rather than fidelity to any real bytecode format.
//!
//! # Key Types
//! - [`OpCode`] - The fixed, enumerated operation table
//! - [`FlowType`] - How an operation affects control flow
//! - [`Instruction`] - An immutable synthesized instruction
//!
//! # Addressing
//!
//! Addresses are index-based: the instruction at sequence index `i` has address
//! `i * INSTRUCTION_STRIDE`. Jump targets are expressed as signed *index* offsets
//! stored in the first operand of a branch instruction, and resolved uniformly as
//! `own index + offset`. One scheme, applied everywhere.

use std::collections::BTreeMap;
use std::fmt;

use strum::{Display, EnumCount, EnumIter, EnumString};

/// Fixed address stride between consecutive synthesized instructions.
pub const INSTRUCTION_STRIDE: u32 = 4;

/// Metadata key carrying the name of the strategy that produced an instruction.
pub const META_STRATEGY: &str = "strategy";

/// Metadata key carrying the source text span (`start..end` byte offsets) an
/// instruction was synthesized from, when known.
pub const META_SPAN: &str = "span";

/// The fixed operation table for synthesized instructions.
///
/// The table is closed: strategies never invent operations outside it, and
/// unknown constructs map to [`OpCode::Nop`] rather than being dropped, which
/// preserves the address continuity the graph builder requires.
///
/// Variant names double as the wire names used by the trace-sampling strategy
/// (events are mapped back through [`std::str::FromStr`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, EnumString,
)]
pub enum OpCode {
    /// Load a constant into a slot. Operands: `[dst, value]`.
    LoadK,
    /// Copy one slot into another. Operands: `[dst, src]`.
    LoadVar,
    /// Store a slot into a named location. Operands: `[dst, src]`.
    StoreVar,
    /// Arithmetic addition. Operands: `[dst, lhs, rhs]`.
    Add,
    /// Arithmetic subtraction. Operands: `[dst, lhs, rhs]`.
    Sub,
    /// Arithmetic multiplication. Operands: `[dst, lhs, rhs]`.
    Mul,
    /// Arithmetic division. Operands: `[dst, lhs, rhs]`.
    Div,
    /// String concatenation. Operands: `[dst, lhs, rhs]`.
    Concat,
    /// Comparison producing a truth value. Operands: `[dst, lhs, rhs]`.
    Compare,
    /// Allocate a fresh table/container. Operands: `[dst]`.
    NewTable,
    /// Read a field out of a container. Operands: `[dst, obj, key]`.
    GetField,
    /// Write a field into a container. Operands: `[obj, key, src]`.
    SetField,
    /// Invoke a callable. Operands: `[dst, callee, argc]`.
    Call,
    /// Return from the enclosing body. No operands.
    Return,
    /// Unconditional jump. Operands: `[offset]` (signed index delta).
    Jump,
    /// Conditional jump. Operands: `[offset, cond]`.
    JumpIf,
    /// Open a lexical scope (`do`, `then`, function body). No operands.
    EnterScope,
    /// Close the innermost lexical scope. No operands.
    LeaveScope,
    /// Unrecognized construct, kept as a placeholder. No operands.
    Nop,
}

impl OpCode {
    /// Returns the fixed operand arity for this operation.
    ///
    /// Strategies zero-fill operands up to this arity when a heuristic finds
    /// fewer literals at the match site.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            OpCode::LoadK | OpCode::LoadVar | OpCode::StoreVar | OpCode::JumpIf => 2,
            OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Concat
            | OpCode::Compare
            | OpCode::GetField
            | OpCode::SetField
            | OpCode::Call => 3,
            OpCode::NewTable | OpCode::Jump => 1,
            OpCode::Return | OpCode::EnterScope | OpCode::LeaveScope | OpCode::Nop => 0,
        }
    }

    /// Returns how this operation affects control flow.
    #[must_use]
    pub const fn flow_type(&self) -> FlowType {
        match self {
            OpCode::Jump => FlowType::UnconditionalBranch,
            OpCode::JumpIf => FlowType::ConditionalBranch,
            OpCode::Return => FlowType::Return,
            _ => FlowType::Sequential,
        }
    }

    /// Returns `true` if this operation opens a lexical scope.
    ///
    /// The reconstructor increments indentation *after* emitting such an
    /// instruction.
    #[must_use]
    pub const fn opens_scope(&self) -> bool {
        matches!(self, OpCode::EnterScope)
    }

    /// Returns `true` if this operation closes a lexical scope.
    ///
    /// The reconstructor decrements indentation *before* emitting such an
    /// instruction (clamped at zero).
    #[must_use]
    pub const fn closes_scope(&self) -> bool {
        matches!(self, OpCode::LeaveScope)
    }
}

/// How an instruction affects control flow.
///
/// This classification drives both leader selection and edge construction in
/// the graph builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowType {
    /// Execution continues with the next instruction.
    Sequential,
    /// Execution always transfers to the jump target; no fall-through.
    UnconditionalBranch,
    /// Execution transfers to the jump target or falls through.
    ConditionalBranch,
    /// Execution leaves the body; no successors.
    Return,
}

impl FlowType {
    /// Returns `true` for branch flow types that carry a jump target.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(
            self,
            FlowType::UnconditionalBranch | FlowType::ConditionalBranch
        )
    }

    /// Returns `true` if execution can fall through to the next instruction.
    #[must_use]
    pub const fn falls_through(&self) -> bool {
        matches!(self, FlowType::Sequential | FlowType::ConditionalBranch)
    }
}

/// A single synthesized instruction.
///
/// Instructions are immutable once created: strategies build them append-only
/// through [`Instruction::new`] and every later stage reads them by reference.
///
/// # Examples
///
/// ```rust
/// use scriptscope::instruction::{Instruction, OpCode, INSTRUCTION_STRIDE};
///
/// let instr = Instruction::new(OpCode::LoadK, vec![0, 42], 3);
/// assert_eq!(instr.address, 3 * INSTRUCTION_STRIDE);
/// assert_eq!(instr.operands, vec![0, 42]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The symbolic operation code.
    pub opcode: OpCode,
    /// Ordered numeric operands, zero-filled up to the opcode's fixed arity.
    pub operands: Vec<i64>,
    /// Monotonic index-based address (`index * INSTRUCTION_STRIDE`).
    pub address: u32,
    /// Size of this instruction; always [`INSTRUCTION_STRIDE`].
    pub size: u32,
    /// Free-form provenance map (producing strategy, source text span).
    pub metadata: BTreeMap<String, String>,
}

impl Instruction {
    /// Creates a new instruction at the given sequence index.
    ///
    /// Operands shorter than the opcode's arity are zero-filled; operands the
    /// heuristic actually found are preserved.
    #[must_use]
    pub fn new(opcode: OpCode, mut operands: Vec<i64>, index: usize) -> Self {
        if operands.len() < opcode.arity() {
            operands.resize(opcode.arity(), 0);
        }
        Self {
            opcode,
            operands,
            address: index as u32 * INSTRUCTION_STRIDE,
            size: INSTRUCTION_STRIDE,
            metadata: BTreeMap::new(),
        }
    }

    /// Attaches a metadata entry, returning the instruction for chaining.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Returns the sequence index this instruction's address encodes.
    #[must_use]
    pub const fn index(&self) -> usize {
        (self.address / INSTRUCTION_STRIDE) as usize
    }

    /// Resolves this instruction's jump target as a sequence index.
    ///
    /// The target is `own index + signed offset in the first operand`. Returns
    /// `None` for non-branch instructions and for targets outside
    /// `0..sequence_len`; a dangling target is never an error, it simply
    /// contributes no leader and no edge.
    #[must_use]
    pub fn jump_target(&self, sequence_len: usize) -> Option<usize> {
        if !self.opcode.flow_type().is_branch() {
            return None;
        }
        let offset = *self.operands.first()?;
        let target = self.index() as i64 + offset;
        if target >= 0 && (target as usize) < sequence_len {
            Some(target as usize)
        } else {
            None
        }
    }

    /// Returns the slot this instruction writes, under the uniform rule
    /// "first operand is the written slot".
    ///
    /// This rule is applied identically to every opcode class; it is an
    /// acknowledged approximation rather than per-opcode semantics, and the
    /// liveness analyzer depends on it being uniform.
    #[must_use]
    pub fn defined_slot(&self) -> Option<i64> {
        self.operands.first().copied()
    }

    /// Returns the slots this instruction reads (all operands past the first),
    /// the counterpart of [`Instruction::defined_slot`].
    #[must_use]
    pub fn used_slots(&self) -> &[i64] {
        if self.operands.is_empty() {
            &[]
        } else {
            &self.operands[1..]
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}: {}", self.address, self.opcode)?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}
