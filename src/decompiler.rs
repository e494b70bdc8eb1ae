//! High-level pipeline entry point.
//!
//! A [`Decompiler`] owns the configuration, the extraction cascade with its
//! memoization cache, the shared diagnostics container and an optional
//! reflection host. It exposes two views of the same pipeline:
//!
//! - [`Decompiler::decompile`] for display consumers, producing the
//!   reconstructed pseudo-source plus a metadata snapshot,
//! - [`Decompiler::analyze`] for structural consumers, exposing the
//!   instruction sequence, control flow graph and liveness sets.
//!
//! Both are infallible by contract. Every degraded condition along the way
//! lands in [`Decompiler::diagnostics`] instead of an `Err`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::{cfg::ControlFlowGraph, liveness, DataFlowInfo};
use crate::diagnostics::Diagnostics;
use crate::extraction::{AnalysisCache, ExtractionCascade};
use crate::instruction::Instruction;
use crate::options::DecompilerOptions;
use crate::reconstruct;
use crate::script::{ReflectionHost, ScriptObject};

/// Placeholder emitted when no strategy could recover any instructions.
const NO_SOURCE: &str = "-- no source available";

/// Display payload for one decompiled script.
///
/// `metadata` carries the script's class name, parent and property snapshot
/// verbatim; display collaborators consume it without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompiledScript {
    /// Reconstructed pseudo-source, or a placeholder comment when extraction
    /// failed entirely.
    pub source: String,
    /// Display metadata snapshot.
    pub metadata: BTreeMap<String, String>,
}

/// Structural payload for advanced consumers.
#[derive(Debug, Clone)]
pub struct ScriptAnalysis {
    /// The synthesized instruction sequence; empty when extraction failed.
    pub instructions: Vec<Instruction>,
    /// Control flow graph over the sequence.
    pub cfg: ControlFlowGraph,
    /// Per-block liveness results.
    pub dataflow: DataFlowInfo,
}

/// The decompilation pipeline.
///
/// # Examples
///
/// ```rust
/// use scriptscope::Decompiler;
/// use scriptscope::script::InMemoryScript;
///
/// let decompiler = Decompiler::new();
/// let script = InMemoryScript::new("game.Main", "local x = 1\nreturn")
///     .with_class_name("LocalScript");
///
/// let result = decompiler.decompile(&script);
/// assert!(result.source.contains("return"));
/// assert_eq!(result.metadata.get("ClassName").map(String::as_str), Some("LocalScript"));
/// ```
pub struct Decompiler {
    options: DecompilerOptions,
    diagnostics: Arc<Diagnostics>,
    cascade: ExtractionCascade,
    host: Option<Arc<dyn ReflectionHost>>,
}

impl Default for Decompiler {
    fn default() -> Self {
        Self::with_options(DecompilerOptions::default())
    }
}

impl Decompiler {
    /// Creates a decompiler with default options and no reflection host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decompiler with explicit options.
    #[must_use]
    pub fn with_options(options: DecompilerOptions) -> Self {
        let diagnostics = Arc::new(Diagnostics::new());
        let cascade = ExtractionCascade::new(options.clone(), Arc::clone(&diagnostics));
        Self {
            options,
            diagnostics,
            cascade,
            host: None,
        }
    }

    /// Attaches a reflection host, enabling the trace-sampling strategy when
    /// the options allow it.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn ReflectionHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Runs the full pipeline and produces the display payload.
    ///
    /// Never fails: a script nothing could be recovered from yields a
    /// placeholder source and the cause is recorded in
    /// [`Decompiler::diagnostics`].
    pub fn decompile(&self, script: &dyn ScriptObject) -> DecompiledScript {
        let outcome = self.cascade.extract(script, self.host.as_deref());

        let source = if outcome.is_empty() {
            NO_SOURCE.to_string()
        } else {
            reconstruct::reconstruct(&outcome.instructions, &self.diagnostics)
        };

        let mut metadata = script.properties();
        metadata.insert("ClassName".to_string(), script.class_name().to_string());
        if let Some(parent) = script.parent_name() {
            metadata.insert("Parent".to_string(), parent.to_string());
        }
        if let Some(strategy) = outcome.strategy {
            metadata.insert("Strategy".to_string(), strategy.to_string());
        }

        DecompiledScript { source, metadata }
    }

    /// Runs extraction and both analyses, exposing the structural results.
    pub fn analyze(&self, script: &dyn ScriptObject) -> ScriptAnalysis {
        let outcome = self.cascade.extract(script, self.host.as_deref());
        let cfg = ControlFlowGraph::build(&outcome.instructions, &self.diagnostics);
        let dataflow = liveness::analyze(&cfg, self.options.iteration_cap, &self.diagnostics);
        ScriptAnalysis {
            instructions: outcome.instructions.clone(),
            cfg,
            dataflow,
        }
    }

    /// The diagnostics recorded by every pipeline run so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The memoization cache shared by all runs of this instance.
    #[must_use]
    pub fn cache(&self) -> &AnalysisCache {
        self.cascade.cache()
    }

    /// The extraction cascade, exposing per-strategy invocation counters.
    #[must_use]
    pub fn cascade(&self) -> &ExtractionCascade {
        &self.cascade
    }

    /// The options this instance was built with.
    #[must_use]
    pub fn options(&self) -> &DecompilerOptions {
        &self.options
    }
}
