//! # scriptscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the scriptscope library. Import this module to get quick access to the essential
//! types for script decompilation.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all scriptscope operations
pub use crate::Error;

/// The result type used throughout scriptscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for the decompilation pipeline
pub use crate::decompiler::{DecompiledScript, Decompiler, ScriptAnalysis};

/// Pipeline configuration
pub use crate::options::{DecompilerOptions, StrategyFlags};

// ================================================================================================
// Input Boundary
// ================================================================================================

/// Script object traits and the in-memory implementation
pub use crate::script::{InMemoryScript, ReflectionHost, ScriptObject, TraceEvent};

// ================================================================================================
// Instruction Model and Analyses
// ================================================================================================

/// The symbolic instruction model
pub use crate::instruction::{FlowType, Instruction, OpCode};

/// Extraction cascade and strategy identification
pub use crate::extraction::{ExtractionCascade, ExtractionOutcome, Strategy};

/// Control flow graph and liveness results
pub use crate::analysis::{BasicBlock, ControlFlowGraph, DataFlowInfo};

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Diagnostics container for soft-failure reporting
pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
