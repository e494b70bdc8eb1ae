//! Ordered strategy dispatch with memoization and soft-failure recovery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strum::{Display, EnumCount, EnumIter};

use crate::diagnostics::{DiagnosticCategory, Diagnostics};
use crate::extraction::{
    cache::{content_hash, AnalysisCache, ExtractionOutcome},
    pattern, seal, signature, tokenize, trace, RawOp,
};
use crate::options::{DecompilerOptions, StrategyFlags};
use crate::script::{ReflectionHost, ScriptObject};
use crate::Result;

/// An extraction strategy, in its fixed priority position.
///
/// The set is closed: dispatch is an exhaustive match, so adding a strategy
/// means extending this enum and every dispatch site fails to compile until
/// it handles the new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum Strategy {
    /// Structural pattern tagging over readable text.
    PatternTag,
    /// Execution-trace sampling through the reflection host.
    TraceSample,
    /// Scanning for known opcode-sequence fragments.
    SignatureScan,
    /// Full synthetic derivation from a tokenized parse.
    Tokenize,
}

impl Strategy {
    /// The fixed priority order the cascade consults strategies in.
    pub const PRIORITY_ORDER: [Strategy; Strategy::COUNT] = [
        Strategy::PatternTag,
        Strategy::TraceSample,
        Strategy::SignatureScan,
        Strategy::Tokenize,
    ];

    /// Stable dense index, used for per-strategy counters.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Strategy::PatternTag => 0,
            Strategy::TraceSample => 1,
            Strategy::SignatureScan => 2,
            Strategy::Tokenize => 3,
        }
    }

    /// The configuration flag gating this strategy.
    #[must_use]
    pub const fn flag(self) -> StrategyFlags {
        match self {
            Strategy::PatternTag => StrategyFlags::PATTERN,
            Strategy::TraceSample => StrategyFlags::TRACE,
            Strategy::SignatureScan => StrategyFlags::SIGNATURE,
            Strategy::Tokenize => StrategyFlags::TOKENIZE,
        }
    }
}

/// Runs the enabled strategies in priority order and memoizes outcomes.
///
/// The cascade never fails: every per-strategy error is recorded as a
/// diagnostic and the next strategy gets its turn. When every strategy is
/// exhausted the outcome is an empty sequence, which is cached like any
/// other so identical text never re-runs a strategy.
pub struct ExtractionCascade {
    options: DecompilerOptions,
    diagnostics: Arc<Diagnostics>,
    cache: AnalysisCache,
    invocations: [AtomicU64; Strategy::COUNT],
}

impl ExtractionCascade {
    /// Creates a cascade with the given configuration and shared diagnostics
    /// sink.
    #[must_use]
    pub fn new(options: DecompilerOptions, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            options,
            diagnostics,
            cache: AnalysisCache::new(),
            invocations: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Extracts an instruction sequence for the given script.
    ///
    /// Outcomes for scripts with readable text are memoized by content hash.
    /// A script without readable text bypasses the cache (two such scripts
    /// with the same missing text can still trace differently) and can only
    /// be recovered through the reflection host.
    pub fn extract(
        &self,
        script: &dyn ScriptObject,
        host: Option<&dyn ReflectionHost>,
    ) -> Arc<ExtractionOutcome> {
        match script.source_text() {
            Some(text) => {
                let hash = content_hash(text);
                self.cache
                    .get_or_compute(hash, || self.run_strategies(text, script, host))
            }
            None => {
                self.diagnostics.info(
                    DiagnosticCategory::Extraction,
                    format!("{}: no readable text property", script.identity()),
                );
                Arc::new(self.run_strategies("", script, host))
            }
        }
    }

    fn run_strategies(
        &self,
        text: &str,
        script: &dyn ScriptObject,
        host: Option<&dyn ReflectionHost>,
    ) -> ExtractionOutcome {
        for strategy in Strategy::PRIORITY_ORDER {
            if !self.options.strategies.contains(strategy.flag()) {
                continue;
            }
            if strategy == Strategy::TraceSample && host.is_none() {
                self.diagnostics.info(
                    DiagnosticCategory::Extraction,
                    "trace sampling skipped: no reflection host attached",
                );
                continue;
            }
            self.invocations[strategy.index()].fetch_add(1, Ordering::Relaxed);

            match self.run_one(strategy, text, script, host) {
                Ok(ops) if !ops.is_empty() => {
                    self.diagnostics.info(
                        DiagnosticCategory::Extraction,
                        format!("{strategy} produced {} instructions", ops.len()),
                    );
                    return ExtractionOutcome {
                        instructions: seal(ops, strategy),
                        strategy: Some(strategy),
                    };
                }
                Ok(_) => {
                    self.diagnostics.info(
                        DiagnosticCategory::Extraction,
                        format!("{strategy} produced no instructions"),
                    );
                }
                Err(e) => {
                    self.diagnostics.warning(
                        DiagnosticCategory::Extraction,
                        format!("{strategy} failed: {e}"),
                    );
                }
            }
        }

        self.diagnostics.warning(
            DiagnosticCategory::Extraction,
            format!("{}: no instructions available", script.identity()),
        );
        ExtractionOutcome::empty()
    }

    fn run_one(
        &self,
        strategy: Strategy,
        text: &str,
        script: &dyn ScriptObject,
        host: Option<&dyn ReflectionHost>,
    ) -> Result<Vec<RawOp>> {
        match strategy {
            Strategy::PatternTag => pattern::extract(text, self.options.max_depth),
            Strategy::TraceSample => match host {
                Some(host) => trace::extract(script, host),
                None => Ok(Vec::new()),
            },
            Strategy::SignatureScan => Ok(signature::extract(text)),
            Strategy::Tokenize => tokenize::extract(text, self.options.max_depth),
        }
    }

    /// Returns how many times a strategy has actually been run (cache hits
    /// run nothing).
    #[must_use]
    pub fn invocation_count(&self, strategy: Strategy) -> u64 {
        self.invocations[strategy.index()].load(Ordering::Relaxed)
    }

    /// The memoization cache backing this cascade.
    #[must_use]
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{InMemoryScript, TraceEvent};
    use crate::Error;

    struct FixedTraceHost {
        events: Vec<TraceEvent>,
    }

    impl ReflectionHost for FixedTraceHost {
        fn sample_trace(&self, _identity: &str) -> Result<Vec<TraceEvent>> {
            Ok(self.events.clone())
        }
    }

    struct FailingHost;

    impl ReflectionHost for FailingHost {
        fn sample_trace(&self, identity: &str) -> Result<Vec<TraceEvent>> {
            Err(Error::Host(format!("{identity}: sandbox rejected trace")))
        }
    }

    fn cascade(options: DecompilerOptions) -> ExtractionCascade {
        ExtractionCascade::new(options, Arc::new(Diagnostics::new()))
    }

    #[test]
    fn test_first_successful_strategy_wins() {
        let cascade = cascade(DecompilerOptions::default());
        let script = InMemoryScript::new("game.Main", "local x = 1\nreturn");
        let outcome = cascade.extract(&script, None);

        assert_eq!(outcome.strategy, Some(Strategy::PatternTag));
        assert_eq!(outcome.instructions.len(), 2);
        assert_eq!(cascade.invocation_count(Strategy::PatternTag), 1);
        assert_eq!(cascade.invocation_count(Strategy::SignatureScan), 0);
        assert_eq!(cascade.invocation_count(Strategy::Tokenize), 0);
    }

    #[test]
    fn test_memoization_never_reruns_strategies() {
        let cascade = cascade(DecompilerOptions::default());
        let script = InMemoryScript::new("game.Main", "local x = 1\nreturn");

        let first = cascade.extract(&script, None);
        let second = cascade.extract(&script, None);

        assert_eq!(first.instructions, second.instructions);
        assert_eq!(cascade.invocation_count(Strategy::PatternTag), 1);
        assert_eq!(cascade.cache().hit_count(), 1);
        assert_eq!(cascade.cache().miss_count(), 1);
    }

    #[test]
    fn test_identical_text_shares_cache_across_scripts() {
        let cascade = cascade(DecompilerOptions::default());
        let a = InMemoryScript::new("game.A", "return");
        let b = InMemoryScript::new("game.B", "return");

        cascade.extract(&a, None);
        cascade.extract(&b, None);

        assert_eq!(cascade.invocation_count(Strategy::PatternTag), 1);
        assert_eq!(cascade.cache().len(), 1);
    }

    #[test]
    fn test_total_failure_is_cached_and_reported() {
        let diagnostics = Arc::new(Diagnostics::new());
        let cascade =
            ExtractionCascade::new(DecompilerOptions::default(), Arc::clone(&diagnostics));
        // Whitespace only: no strategy can synthesize anything
        let script = InMemoryScript::new("game.Empty", "   \n\t\n");

        let outcome = cascade.extract(&script, None);
        assert!(outcome.is_empty());
        assert!(outcome.strategy.is_none());
        assert!(diagnostics.has_warnings());

        cascade.extract(&script, None);
        assert_eq!(cascade.invocation_count(Strategy::Tokenize), 1);
    }

    #[test]
    fn test_host_error_is_soft() {
        let diagnostics = Arc::new(Diagnostics::new());
        let options = DecompilerOptions::default().with_trace_extraction();
        let cascade = ExtractionCascade::new(options, Arc::clone(&diagnostics));
        // Garbage text: pattern tagging declares failure, trace errors,
        // signature scanning finds nothing, tokenize still delivers
        let script = InMemoryScript::new("game.Main", "@@ 1 @@");

        let outcome = cascade.extract(&script, Some(&FailingHost));
        assert_eq!(outcome.strategy, Some(Strategy::Tokenize));
        assert_eq!(cascade.invocation_count(Strategy::TraceSample), 1);
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("sandbox rejected trace")));
    }

    #[test]
    fn test_trace_recovers_script_without_text() {
        let options = DecompilerOptions::default().with_trace_extraction();
        let cascade = cascade(options);
        let host = FixedTraceHost {
            events: vec![
                TraceEvent::new("LoadK", vec![0, 7]),
                TraceEvent::new("Return", vec![]),
            ],
        };
        let script = InMemoryScript::without_text("game.Hidden");

        let outcome = cascade.extract(&script, Some(&host));
        assert_eq!(outcome.strategy, Some(Strategy::TraceSample));
        assert_eq!(outcome.instructions.len(), 2);
    }

    #[test]
    fn test_disabled_strategies_never_run() {
        let options = DecompilerOptions::default().with_strategies(StrategyFlags::TOKENIZE);
        let cascade = cascade(options);
        let script = InMemoryScript::new("game.Main", "local x = 1");

        let outcome = cascade.extract(&script, None);
        assert_eq!(outcome.strategy, Some(Strategy::Tokenize));
        assert_eq!(cascade.invocation_count(Strategy::PatternTag), 0);
        assert_eq!(cascade.invocation_count(Strategy::SignatureScan), 0);
    }
}
