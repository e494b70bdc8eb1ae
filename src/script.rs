//! Input boundary for opaque script objects.
//!
//! The pipeline assumes nothing about its input beyond this module: a script
//! exposes an identity usable for content addressing, an optional readable
//! text property, and display metadata (class name, parent, property
//! snapshot). When the host environment additionally allows execution-level
//! reflection, that capability is injected as a [`ReflectionHost`] so the
//! core stays testable without a real host and host-specific implementations
//! remain swappable.

use std::collections::BTreeMap;

use crate::Result;

/// An opaque script object the pipeline can attempt to decompile.
///
/// All pipeline stages are read-only with respect to the script object.
pub trait ScriptObject {
    /// A stable identity for this object, usable for content addressing and
    /// for reflection lookups by the host.
    fn identity(&self) -> &str;

    /// The readable text property, if the host exposes one.
    ///
    /// `None` means no direct textual evidence is available; the cascade may
    /// still recover instructions through the reflection host.
    fn source_text(&self) -> Option<&str>;

    /// The host-side class name of this object.
    fn class_name(&self) -> &str {
        "Script"
    }

    /// The name of this object's parent in the host hierarchy, if any.
    fn parent_name(&self) -> Option<&str> {
        None
    }

    /// A snapshot of displayable properties, passed through verbatim to the
    /// display collaborator.
    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// A single event sampled from a script's execution.
///
/// Events are produced by the reflection host and mapped back onto the fixed
/// opcode table by name; unrecognized names become no-op placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Operation name, matched against [`crate::instruction::OpCode`] variant names.
    pub name: String,
    /// Numeric values observed alongside the event, used as operands.
    pub values: Vec<i64>,
}

impl TraceEvent {
    /// Creates a new trace event.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Injected execution/reflection capability.
///
/// The trace-sampling extraction strategy calls through this trait; it is the
/// only place the pipeline touches an external execution context. Any failure
/// or timeout inside an implementation must be returned as an `Err`, which the
/// cascade recovers from as a soft per-strategy failure.
pub trait ReflectionHost: Send + Sync {
    /// Samples an execution trace for the script with the given identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot produce a trace; the cascade never
    /// propagates it further than a diagnostic.
    fn sample_trace(&self, identity: &str) -> Result<Vec<TraceEvent>>;
}

/// A script object held entirely in memory.
///
/// The canonical [`ScriptObject`] implementation for hosts that already have
/// the text in hand, and the one used throughout the test suite.
///
/// # Examples
///
/// ```rust
/// use scriptscope::script::{InMemoryScript, ScriptObject};
///
/// let script = InMemoryScript::new("game.Main", "return")
///     .with_class_name("LocalScript")
///     .with_parent("game")
///     .with_property("Disabled", "false");
/// assert_eq!(script.class_name(), "LocalScript");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryScript {
    identity: String,
    text: Option<String>,
    class_name: String,
    parent: Option<String>,
    properties: BTreeMap<String, String>,
}

impl InMemoryScript {
    /// Creates a script with the given identity and text.
    #[must_use]
    pub fn new(identity: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            text: Some(text.into()),
            class_name: "Script".to_string(),
            parent: None,
            properties: BTreeMap::new(),
        }
    }

    /// Creates a script with an identity but no readable text property.
    #[must_use]
    pub fn without_text(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            text: None,
            class_name: "Script".to_string(),
            parent: None,
            properties: BTreeMap::new(),
        }
    }

    /// Sets the class name reported to the display collaborator.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Sets the parent name reported to the display collaborator.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a property to the display snapshot.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl ScriptObject for InMemoryScript {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn source_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    fn properties(&self) -> BTreeMap<String, String> {
        self.properties.clone()
    }
}
