// Copyright 2025 scriptscope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![allow(dead_code)]

//! # scriptscope
//!
//! A framework for recovering an approximation of an opaque script object's source text
//! and re-deriving structural program information from it.
//!
//! Script objects in sandboxed host environments frequently expose only indirect,
//! partial signals about their original text: a possibly-empty readable text property,
//! an identity, and (when the host allows it) a narrow reflection surface. `scriptscope`
//! turns whatever evidence is available into a symbolic instruction trace, builds a
//! control flow graph over it, computes live-variable information, and linearizes the
//! graph back into readable pseudo-source for display and downstream scanning.
//!
//! ## Pipeline
//!
//! ```text
//! script object ──▶ extraction cascade ──▶ instruction sequence
//!                                               │
//!                         ┌─────────────────────┤
//!                         ▼                     ▼
//!                  control flow graph    source reconstructor
//!                         │                     │
//!                         ▼                     ▼
//!                  liveness analysis     pseudo-source text
//! ```
//!
//! - **Extraction cascade** - tries independent strategies in fixed priority order
//!   (structural pattern tagging, execution-trace sampling, signature scanning,
//!   tokenized derivation) and memoizes the first nonempty result by content hash.
//! - **CFG builder** - classic leader-based basic-block partitioning with index edges.
//! - **Liveness analysis** - backward iterative fixed point over the CFG.
//! - **Source reconstructor** - synthesized labels plus per-opcode templates with
//!   indentation tracking.
//!
//! ## Quick Start
//!
//! ```rust
//! use scriptscope::prelude::*;
//!
//! let script = InMemoryScript::new("demo", "local x = 1\nreturn");
//! let decompiler = Decompiler::new();
//!
//! let result = decompiler.decompile(&script);
//! println!("{}", result.source);
//! ```
//!
//! ## Approximation, not recovery
//!
//! Nothing here claims bit-exact recovery of a real bytecode format. The pipeline
//! synthesizes a *plausible* instruction trace from whatever textual or structural
//! evidence is available; its contracts are internal consistency (idempotence, cache
//! correctness, graph well-formedness), not fidelity to any particular instruction set.
//! Reconstructed text is a readable skeleton for display and pattern scanning, not a
//! recompilable reconstruction.
//!
//! ## Failure model
//!
//! Failures degrade, they never abort:
//!
//! - A single strategy that errors or produces nothing is a *soft* failure; the
//!   cascade records a diagnostic and tries the next strategy.
//! - All strategies exhausted is "no instructions available", not an error.
//! - An empty instruction sequence yields a zero-block graph, not an error.
//! - A liveness run that hits the iteration cap returns best-effort sets flagged
//!   as non-converged, plus a warning diagnostic.
//!
//! Soft conditions are observable through the [`diagnostics::Diagnostics`] container
//! owned by each [`Decompiler`].
#[macro_use]
pub(crate) mod error;

/// Diagnostics collection for lenient pipeline execution.
///
/// Soft failures (strategy errors, non-convergence) are recorded here rather than
/// propagated. See [`diagnostics::Diagnostics`].
pub mod diagnostics;

/// The symbolic instruction model.
///
/// Defines the fixed opcode table ([`instruction::OpCode`]), control-flow
/// classification ([`instruction::FlowType`]) and the immutable
/// [`instruction::Instruction`] produced by the extraction cascade.
pub mod instruction;

/// Configuration surface for the pipeline.
///
/// [`options::DecompilerOptions`] carries the traversal depth limit, the set of
/// enabled extraction strategies and the liveness iteration cap.
pub mod options;

/// Input boundary traits for opaque script objects.
///
/// [`script::ScriptObject`] is the only shape the pipeline assumes of its input;
/// [`script::ReflectionHost`] is the injected capability used by the
/// trace-sampling strategy.
pub mod script;

/// The ordered, memoized extraction cascade and its strategies.
///
/// [`extraction::ExtractionCascade`] tries strategies in fixed priority order and
/// memoizes outcomes by a SHA-1 content hash of the script text.
pub mod extraction;

/// Control-flow graph construction and data flow analysis.
///
/// [`analysis::ControlFlowGraph`] partitions an instruction sequence into basic
/// blocks; [`analysis::liveness`] computes live-variable sets over it.
pub mod analysis;

/// Linearization of an instruction sequence back into pseudo-source.
pub mod reconstruct;

/// The high-level pipeline entry point.
///
/// [`decompiler::Decompiler`] owns the options, cascade, cache and diagnostics and
/// exposes [`decompiler::Decompiler::decompile`] for display consumers and
/// [`decompiler::Decompiler::analyze`] for structural consumers.
pub mod decompiler;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use scriptscope::prelude::*;
///
/// let script = InMemoryScript::new("demo", "return");
/// let result = Decompiler::new().decompile(&script);
/// # let _ = result;
/// ```
pub mod prelude;

/// `scriptscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `scriptscope` Error type
///
/// The main error type for all operations in this crate. Errors are rare by design:
/// the cascade converts strategy failures into diagnostics instead of propagating them.
pub use error::Error;

/// Main entry point for decompiling script objects.
///
/// See [`decompiler::Decompiler`] for the pipeline API.
///
/// # Example
///
/// ```rust
/// use scriptscope::{Decompiler, script::InMemoryScript};
///
/// let script = InMemoryScript::new("demo", "local x = 1\nreturn");
/// let result = Decompiler::new().decompile(&script);
/// assert!(result.metadata.contains_key("ClassName"));
/// ```
pub use decompiler::{DecompiledScript, Decompiler};
