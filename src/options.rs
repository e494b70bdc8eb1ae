//! Configuration for the decompilation pipeline.
//!
//! This is the complete configuration surface of the pipeline: a traversal
//! depth limit for synthesis strategies, a flag set selecting which extraction
//! strategies may run, and an override for the liveness iteration cap. No
//! other configuration affects these stages.

use bitflags::bitflags;

bitflags! {
    /// Selects which extraction strategies the cascade is allowed to run.
    ///
    /// Strategy *order* is fixed; these flags only gate participation. The
    /// trace-sampling strategy is off by default because it briefly invokes a
    /// real execution context through the reflection host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StrategyFlags: u8 {
        /// Structural pattern tagging over readable text.
        const PATTERN = 1;
        /// Execution-trace sampling through the reflection host.
        const TRACE = 1 << 1;
        /// Signature scanning for known opcode-sequence fragments.
        const SIGNATURE = 1 << 2;
        /// Full synthetic derivation from a tokenized parse.
        const TOKENIZE = 1 << 3;
    }
}

/// Configuration for a [`crate::Decompiler`] instance.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `max_depth` | 64 |
/// | `strategies` | `PATTERN \| SIGNATURE \| TOKENIZE` |
/// | `iteration_cap` | 100 |
///
/// # Examples
///
/// ```rust
/// use scriptscope::options::DecompilerOptions;
///
/// let options = DecompilerOptions::default()
///     .with_trace_extraction()
///     .with_iteration_cap(50);
/// assert_eq!(options.iteration_cap, 50);
/// ```
#[derive(Debug, Clone)]
pub struct DecompilerOptions {
    /// Maximum nesting depth synthesis strategies will traverse before
    /// failing softly with a recursion-limit condition.
    pub max_depth: usize,

    /// The set of extraction strategies allowed to run.
    pub strategies: StrategyFlags,

    /// Iteration cap for the liveness fixed point.
    ///
    /// The cap is a non-termination guard for pathological inputs, not the
    /// termination proof: a finite graph converges in at most one pass per
    /// block under the uniform transfer rule.
    pub iteration_cap: usize,
}

impl Default for DecompilerOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            strategies: StrategyFlags::PATTERN | StrategyFlags::SIGNATURE | StrategyFlags::TOKENIZE,
            iteration_cap: 100,
        }
    }
}

impl DecompilerOptions {
    /// Enables the deeper execution-trace extraction strategy.
    ///
    /// Requires a [`crate::script::ReflectionHost`] to be attached to the
    /// decompiler, otherwise the strategy is skipped at run time.
    #[must_use]
    pub fn with_trace_extraction(mut self) -> Self {
        self.strategies |= StrategyFlags::TRACE;
        self
    }

    /// Overrides the liveness iteration cap.
    #[must_use]
    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = cap;
        self
    }

    /// Overrides the synthesis nesting depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Replaces the enabled strategy set entirely.
    #[must_use]
    pub fn with_strategies(mut self, strategies: StrategyFlags) -> Self {
        self.strategies = strategies;
        self
    }
}
