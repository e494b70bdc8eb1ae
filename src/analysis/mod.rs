//! Control flow and data flow analysis over synthesized instructions.
//!
//! The analyses run strictly after extraction and before reconstruction:
//!
//! ```text
//! instructions ──> ControlFlowGraph::build ──> liveness::analyze
//! ```
//!
//! Both stages are total functions over their inputs. Malformed flow (a jump
//! whose target falls outside the sequence) degrades to a missing edge, and a
//! liveness run that exhausts its iteration budget returns the partial result
//! it reached, flagged as non-converged.

pub mod cfg;
pub mod liveness;

pub use cfg::{BasicBlock, ControlFlowGraph};
pub use liveness::DataFlowInfo;
