//! Configuration options for formula evaluation and text persistence.

/// Default maximum nesting of formula evaluations.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration options for formula evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum number of nested formula evaluations (a formula reading a
    /// formula sibling counts as one level). Default: 64
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EvalConfig {
    /// Set the maximum evaluation depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Configuration options for the JSON snapshot writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonConfig {
    /// Whether to indent the output. Default: false
    pub pretty: bool,
}

impl JsonConfig {
    /// A configuration producing indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}
