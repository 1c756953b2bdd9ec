use crate::formatter::PrettyPrinter;
use std::env;

pub const LOWERING_ENV: &str = "TRACE_IR_LOWERING";
pub const INDENT_ENV: &str = "TRACE_IR_INDENT";
pub const LOG_ENV: &str = "TRACE_IR_LOG";

/// Process settings, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceConfig {
    /// Stack a lowering layer on top of the default evaluator.
    pub lowering: bool,
    /// Spaces per nesting level when pretty-printing.
    pub indent: usize,
    /// `tracing` filter directive used by `logging::init`.
    pub log_filter: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            lowering: true,
            indent: 2,
            log_filter: None,
        }
    }
}

impl TraceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let lowering = lookup(LOWERING_ENV)
            .map(|raw| !matches!(raw.trim().to_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.lowering);
        let indent = lookup(INDENT_ENV)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(defaults.indent);
        let log_filter = lookup(LOG_ENV).filter(|f| !f.trim().is_empty());
        Self {
            lowering,
            indent,
            log_filter,
        }
    }

    pub fn printer(&self) -> PrettyPrinter {
        PrettyPrinter::with_indent(self.indent)
    }
}
