//! Leader-based control flow graph construction.
//!
//! Blocks are partitioned with the classic leader rule:
//! - instruction 0 is a leader,
//! - every resolvable jump target is a leader,
//! - the instruction after any branch or return is a leader.
//!
//! Each block runs from its leader up to (not including) the next leader.
//! Edges follow the per-opcode flow type: a conditional branch gets both its
//! target edge and its fall-through edge, an unconditional branch only the
//! target edge, a return none. A jump target outside the sequence simply
//! contributes no leader and no edge; it is reported as a diagnostic, never
//! an error.
//!
//! Blocks live in an arena [`Vec`] and refer to each other by index, so the
//! graph is a plain owned value with no interior cycles.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::instruction::{FlowType, Instruction, INSTRUCTION_STRIDE};

/// A maximal straight-line run of instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Arena index of this block.
    pub id: usize,
    /// The instructions in execution order; never empty.
    pub instructions: Vec<Instruction>,
    /// Address of the first instruction.
    pub start_address: u32,
    /// Address one past the last instruction.
    pub end_address: u32,
    /// Arena indices of blocks that can transfer here.
    pub predecessors: Vec<usize>,
    /// Arena indices of blocks this one can transfer to.
    pub successors: Vec<usize>,
}

impl BasicBlock {
    /// The sequence index of this block's leader.
    #[must_use]
    pub const fn leader_index(&self) -> usize {
        (self.start_address / INSTRUCTION_STRIDE) as usize
    }

    /// The last instruction, which determines this block's outgoing edges.
    #[must_use]
    pub fn terminator(&self) -> &Instruction {
        // Blocks are constructed non-empty
        &self.instructions[self.instructions.len() - 1]
    }

    /// Returns `true` if this block has no outgoing edges.
    #[must_use]
    pub fn is_exit(&self) -> bool {
        self.successors.is_empty()
    }
}

/// A control flow graph over one instruction sequence.
///
/// # Examples
///
/// ```rust
/// use scriptscope::analysis::ControlFlowGraph;
/// use scriptscope::diagnostics::Diagnostics;
/// use scriptscope::instruction::{Instruction, OpCode};
///
/// let instructions = vec![
///     Instruction::new(OpCode::JumpIf, vec![2, 0], 0),
///     Instruction::new(OpCode::Nop, vec![], 1),
///     Instruction::new(OpCode::Return, vec![], 2),
/// ];
/// let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());
/// assert_eq!(cfg.block_count(), 3);
/// assert_eq!(cfg.entry, Some(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControlFlowGraph {
    /// Block arena, ordered by start address.
    pub blocks: Vec<BasicBlock>,
    /// Index of the entry block; `None` only for an empty sequence.
    pub entry: Option<usize>,
    /// Indices of blocks with no outgoing edges.
    pub exits: Vec<usize>,
}

impl ControlFlowGraph {
    /// Builds the graph for an instruction sequence.
    ///
    /// An empty sequence produces an empty graph with no entry. Dangling jump
    /// targets are reported to `diagnostics` and otherwise ignored.
    #[must_use]
    pub fn build(instructions: &[Instruction], diagnostics: &Diagnostics) -> Self {
        if instructions.is_empty() {
            return Self::default();
        }
        let len = instructions.len();

        let mut leaders = BTreeSet::new();
        leaders.insert(0);
        for (index, instr) in instructions.iter().enumerate() {
            let flow = instr.opcode.flow_type();
            if flow.is_branch() {
                match instr.jump_target(len) {
                    Some(target) => {
                        leaders.insert(target);
                    }
                    None => {
                        diagnostics.warning(
                            DiagnosticCategory::ControlFlow,
                            format!(
                                "jump at {:04X} targets outside the sequence",
                                instr.address
                            ),
                        );
                    }
                }
            }
            if (flow.is_branch() || flow == FlowType::Return) && index + 1 < len {
                leaders.insert(index + 1);
            }
        }

        // Partition: each block runs from its leader to the next leader
        let leader_list: Vec<usize> = leaders.iter().copied().collect();
        let mut blocks: Vec<BasicBlock> = leader_list
            .iter()
            .enumerate()
            .map(|(id, &start)| {
                let end = leader_list.get(id + 1).copied().unwrap_or(len);
                BasicBlock {
                    id,
                    instructions: instructions[start..end].to_vec(),
                    start_address: instructions[start].address,
                    end_address: instructions[end - 1].address + instructions[end - 1].size,
                    predecessors: Vec::new(),
                    successors: Vec::new(),
                }
            })
            .collect();

        let block_of = |index: usize| leader_list.partition_point(|&l| l <= index) - 1;

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for id in 0..leader_list.len() {
            let end = leader_list.get(id + 1).copied().unwrap_or(len);
            let last = &instructions[end - 1];
            let flow = last.opcode.flow_type();

            if flow.is_branch() {
                if let Some(target) = last.jump_target(len) {
                    edges.push((id, block_of(target)));
                }
            }
            if flow.falls_through() && end < len {
                let fall = (id, block_of(end));
                if !edges.contains(&fall) {
                    edges.push(fall);
                }
            }
        }

        for (from, to) in edges {
            if !blocks[from].successors.contains(&to) {
                blocks[from].successors.push(to);
            }
            if !blocks[to].predecessors.contains(&from) {
                blocks[to].predecessors.push(from);
            }
        }

        let exits = blocks
            .iter()
            .filter(|block| block.successors.is_empty())
            .map(|block| block.id)
            .collect();

        Self {
            blocks,
            entry: Some(0),
            exits,
        }
    }

    /// Number of blocks in the graph.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Looks up a block by arena index.
    #[must_use]
    pub fn block(&self, id: usize) -> Option<&BasicBlock> {
        self.blocks.get(id)
    }

    /// Returns the block containing the instruction at `index`, if any.
    #[must_use]
    pub fn block_containing(&self, index: usize) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| {
            let start = block.leader_index();
            index >= start && index < start + block.instructions.len()
        })
    }

    /// Block ids in postorder from the entry.
    ///
    /// Blocks unreachable from the entry are appended after the reachable
    /// postorder, in arena order, so every block appears exactly once.
    #[must_use]
    pub fn postorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut visited = vec![false; self.blocks.len()];

        if let Some(entry) = self.entry {
            // Iterative DFS; the second stack element marks the exit visit
            let mut stack = vec![(entry, false)];
            while let Some((id, children_done)) = stack.pop() {
                if children_done {
                    order.push(id);
                    continue;
                }
                if visited[id] {
                    continue;
                }
                visited[id] = true;
                stack.push((id, true));
                for &succ in self.blocks[id].successors.iter().rev() {
                    if !visited[succ] {
                        stack.push((succ, false));
                    }
                }
            }
        }
        for block in &self.blocks {
            if !visited[block.id] {
                order.push(block.id);
            }
        }
        order
    }

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph cfg {\n  node [shape=box fontname=monospace];\n");
        for block in &self.blocks {
            let mut label = format!("block {}\\l", block.id);
            for instr in &block.instructions {
                let _ = write!(label, "{instr}\\l");
            }
            let style = if Some(block.id) == self.entry {
                " color=blue penwidth=2"
            } else if block.is_exit() {
                " peripheries=2"
            } else {
                ""
            };
            let _ = writeln!(out, "  b{} [label=\"{}\"{}];", block.id, label, style);
            for &succ in &block.successors {
                let _ = writeln!(out, "  b{} -> b{};", block.id, succ);
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::OpCode;

    fn seq(ops: &[(OpCode, Vec<i64>)]) -> Vec<Instruction> {
        ops.iter()
            .enumerate()
            .map(|(index, (opcode, operands))| {
                Instruction::new(*opcode, operands.clone(), index)
            })
            .collect()
    }

    #[test]
    fn test_empty_sequence() {
        let cfg = ControlFlowGraph::build(&[], &Diagnostics::new());
        assert_eq!(cfg.block_count(), 0);
        assert_eq!(cfg.entry, None);
        assert!(cfg.exits.is_empty());
    }

    #[test]
    fn test_straight_line_is_one_block() {
        let instructions = seq(&[
            (OpCode::LoadK, vec![0, 1]),
            (OpCode::LoadK, vec![1, 2]),
            (OpCode::Add, vec![2, 0, 1]),
        ]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());
        assert_eq!(cfg.block_count(), 1);
        assert_eq!(cfg.entry, Some(0));
        assert_eq!(cfg.exits, vec![0]);
        assert_eq!(cfg.blocks[0].instructions.len(), 3);
    }

    #[test]
    fn test_conditional_branch_partitioning() {
        // LoadK; LoadK; Add; JumpIf +2 -> Call at index 5 is skipped when taken
        let instructions = seq(&[
            (OpCode::LoadK, vec![0, 1]),
            (OpCode::LoadK, vec![1, 2]),
            (OpCode::Add, vec![2, 0, 1]),
            (OpCode::JumpIf, vec![2, 2]),
            (OpCode::Call, vec![3, 4, 0]),
            (OpCode::Return, vec![]),
        ]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());

        assert_eq!(cfg.block_count(), 3);
        let jump_block = cfg.block_containing(3).unwrap();
        assert_eq!(jump_block.instructions.len(), 4);
        assert_eq!(jump_block.successors.len(), 2);

        let call_block = cfg.block_containing(4).unwrap();
        assert_eq!(call_block.successors.len(), 1);
        assert_eq!(call_block.predecessors, vec![jump_block.id]);

        let return_block = cfg.block_containing(5).unwrap();
        assert!(return_block.is_exit());
        assert_eq!(return_block.predecessors.len(), 2);
        assert_eq!(cfg.exits, vec![return_block.id]);
    }

    #[test]
    fn test_unconditional_branch_has_no_fallthrough_edge() {
        let instructions = seq(&[
            (OpCode::Jump, vec![2]),
            (OpCode::Nop, vec![]),
            (OpCode::Return, vec![]),
        ]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());

        assert_eq!(cfg.block_count(), 3);
        let jump_block = cfg.block_containing(0).unwrap();
        assert_eq!(jump_block.successors.len(), 1);
        assert_eq!(jump_block.successors[0], cfg.block_containing(2).unwrap().id);

        // The skipped Nop block is unreachable but still present
        let nop_block = cfg.block_containing(1).unwrap();
        assert!(nop_block.predecessors.is_empty());
    }

    #[test]
    fn test_dangling_target_degrades_to_missing_edge() {
        let diagnostics = Diagnostics::new();
        let instructions = seq(&[(OpCode::Jump, vec![100]), (OpCode::Return, vec![])]);
        let cfg = ControlFlowGraph::build(&instructions, &diagnostics);

        assert_eq!(cfg.block_count(), 2);
        assert!(cfg.blocks[0].successors.is_empty());
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn test_backward_jump_forms_loop() {
        let instructions = seq(&[
            (OpCode::LoadK, vec![0, 10]),
            (OpCode::Sub, vec![0, 0, 1]),
            (OpCode::JumpIf, vec![-1, 0]),
            (OpCode::Return, vec![]),
        ]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());

        let loop_block = cfg.block_containing(1).unwrap();
        assert!(loop_block.successors.contains(&loop_block.id));
        assert!(loop_block.predecessors.contains(&loop_block.id));
    }

    #[test]
    fn test_postorder_visits_every_block_once() {
        let instructions = seq(&[
            (OpCode::JumpIf, vec![2, 0]),
            (OpCode::Nop, vec![]),
            (OpCode::Return, vec![]),
        ]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());

        let mut order = cfg.postorder();
        assert_eq!(order.len(), cfg.block_count());
        order.sort_unstable();
        order.dedup();
        assert_eq!(order.len(), cfg.block_count());
    }

    #[test]
    fn test_dot_export() {
        let instructions = seq(&[(OpCode::Jump, vec![1]), (OpCode::Return, vec![])]);
        let cfg = ControlFlowGraph::build(&instructions, &Diagnostics::new());
        let dot = cfg.to_dot();
        assert!(dot.starts_with("digraph cfg {"));
        assert!(dot.contains("b0 -> b1;"));
    }
}
