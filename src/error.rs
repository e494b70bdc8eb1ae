use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors in this crate are deliberately rare: the extraction cascade treats every strategy
/// failure as a *soft* condition (caught, recorded as a diagnostic, next strategy tried), so
/// these variants surface only inside individual strategies and at the trait boundary to the
/// reflection host. Nothing in the pipeline is fatal to the host process.
///
/// # Error Categories
///
/// ## Synthesis Errors
/// - [`Error::Malformed`] - Text that a strategy recognized but could not synthesize from
/// - [`Error::RecursionLimit`] - Nesting depth exceeded the configured traversal limit
///
/// ## Collaborator Errors
/// - [`Error::Host`] - The injected reflection/execution host reported a failure or timeout
///
/// # Examples
///
/// ```rust
/// use scriptscope::{Error, Result};
///
/// fn check_depth(depth: usize, limit: usize) -> Result<()> {
///     if depth > limit {
///         return Err(Error::RecursionLimit(limit));
///     }
///     Ok(())
/// }
///
/// match check_depth(100, 64) {
///     Err(Error::RecursionLimit(limit)) => eprintln!("limit {} exceeded", limit),
///     _ => {}
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input text was recognized but could not be synthesized from.
    ///
    /// This error occurs when a strategy matched a construct but the construct's
    /// content is unusable, such as a numeric literal that overflows the operand
    /// range. The error includes the source location where the malformation was
    /// detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Recursion limit reached.
    ///
    /// To bound work on pathological inputs, synthesis strategies enforce a
    /// maximum nesting depth while walking scope constructs. This error
    /// indicates that limit was exceeded; the cascade treats it as a soft
    /// per-strategy failure.
    ///
    /// The associated value shows the depth limit that was reached.
    #[error("Reached the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// The reflection/execution host reported a failure.
    ///
    /// The trace-sampling strategy briefly invokes a real execution context
    /// through the injected [`crate::script::ReflectionHost`]. Any internal
    /// failure or timeout inside that collaborator is wrapped in this variant
    /// and recovered by the cascade.
    #[error("Reflection host failure: {0}")]
    Host(String),
}
