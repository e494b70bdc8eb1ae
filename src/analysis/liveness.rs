//! Backward iterative liveness over value slots.
//!
//! Per-block def/use sets come from the uniform rule on
//! [`Instruction::defined_slot`] and [`Instruction::used_slots`]: walking a
//! block backward, a slot is *used* if it is read before any write in the
//! block, and *defined* if it is written at all. The fixed point is then the
//! standard backward system
//!
//! ```text
//! live_out[b] = union of live_in over successors of b
//! live_in[b]  = use[b] ∪ (live_out[b] − def[b])
//! ```
//!
//! iterated in postorder until no set changes. The iteration cap is a guard
//! against pathological inputs only; hitting it returns the partial sets
//! reached so far with `converged` cleared and a diagnostic recorded, never
//! an error.

use std::collections::BTreeSet;

use crate::analysis::cfg::ControlFlowGraph;
use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::instruction::Instruction;

/// Per-block liveness results, indexed by block arena id.
#[derive(Debug, Clone, Default)]
pub struct DataFlowInfo {
    /// Slots written somewhere in each block.
    pub defs: Vec<BTreeSet<i64>>,
    /// Slots read before any write in each block.
    pub uses: Vec<BTreeSet<i64>>,
    /// Slots live on entry to each block.
    pub live_in: Vec<BTreeSet<i64>>,
    /// Slots live on exit from each block.
    pub live_out: Vec<BTreeSet<i64>>,
    /// `false` when the iteration cap cut the fixed point short.
    pub converged: bool,
    /// Number of full passes actually performed.
    pub iterations: usize,
}

impl DataFlowInfo {
    /// Returns `true` if `slot` is live entering block `block_id`.
    #[must_use]
    pub fn is_live_in(&self, block_id: usize, slot: i64) -> bool {
        self.live_in
            .get(block_id)
            .is_some_and(|set| set.contains(&slot))
    }

    /// Returns `true` if `slot` is live leaving block `block_id`.
    #[must_use]
    pub fn is_live_out(&self, block_id: usize, slot: i64) -> bool {
        self.live_out
            .get(block_id)
            .is_some_and(|set| set.contains(&slot))
    }
}

/// Local def/use for one block, walking its instructions backward.
fn block_def_use(instructions: &[Instruction]) -> (BTreeSet<i64>, BTreeSet<i64>) {
    let mut defs = BTreeSet::new();
    let mut uses = BTreeSet::new();
    for instr in instructions.iter().rev() {
        if let Some(def) = instr.defined_slot() {
            defs.insert(def);
            uses.remove(&def);
        }
        for &used in instr.used_slots() {
            uses.insert(used);
        }
    }
    (defs, uses)
}

/// Runs the backward liveness fixed point over `cfg`.
///
/// `iteration_cap` bounds the number of full passes; exceeding it is reported
/// to `diagnostics` and reflected in [`DataFlowInfo::converged`].
#[must_use]
pub fn analyze(
    cfg: &ControlFlowGraph,
    iteration_cap: usize,
    diagnostics: &Diagnostics,
) -> DataFlowInfo {
    let count = cfg.block_count();
    if count == 0 {
        return DataFlowInfo {
            converged: true,
            ..DataFlowInfo::default()
        };
    }

    let mut defs = Vec::with_capacity(count);
    let mut uses = Vec::with_capacity(count);
    for block in &cfg.blocks {
        let (d, u) = block_def_use(&block.instructions);
        defs.push(d);
        uses.push(u);
    }

    let mut live_in: Vec<BTreeSet<i64>> = vec![BTreeSet::new(); count];
    let mut live_out: Vec<BTreeSet<i64>> = vec![BTreeSet::new(); count];
    let order = cfg.postorder();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < iteration_cap {
        iterations += 1;
        let mut changed = false;

        for &id in &order {
            let mut out = BTreeSet::new();
            for &succ in &cfg.blocks[id].successors {
                out.extend(live_in[succ].iter().copied());
            }

            let mut inn = uses[id].clone();
            for &slot in &out {
                if !defs[id].contains(&slot) {
                    inn.insert(slot);
                }
            }

            if out != live_out[id] {
                live_out[id] = out;
                changed = true;
            }
            if inn != live_in[id] {
                live_in[id] = inn;
                changed = true;
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        diagnostics.warning(
            DiagnosticCategory::DataFlow,
            format!("liveness did not converge within {iteration_cap} iterations"),
        );
    }

    DataFlowInfo {
        defs,
        uses,
        live_in,
        live_out,
        converged,
        iterations,
    }
}
