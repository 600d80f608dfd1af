//! Verbosity-gated analysis tracing.
//!
//! Thin layer over `tracing`: the analyzer decides *whether* an event is
//! interesting via [`TraceLevel`]; the subscriber installed by the host
//! decides where it goes. Analysis code never talks to the subscriber
//! directly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How much analysis detail to emit, from nothing to every node visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TraceLevel {
    #[default]
    Off,
    /// Only internal errors and invariant violations.
    Errors,
    /// Symbol definition and resolution events.
    Symbols,
    /// Scope creation/enter/exit as well.
    Scopes,
    /// Every statement/expression visit.
    Nodes,
    Verbose,
}

impl TraceLevel {
    pub fn enables(self, required: TraceLevel) -> bool {
        self >= required
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown trace level `{0}`, expected off|errors|symbols|scopes|nodes|verbose")]
pub struct ParseTraceLevelError(String);

impl FromStr for TraceLevel {
    type Err = ParseTraceLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "errors" => Ok(Self::Errors),
            "symbols" => Ok(Self::Symbols),
            "scopes" => Ok(Self::Scopes),
            "nodes" => Ok(Self::Nodes),
            "verbose" => Ok(Self::Verbose),
            _ => Err(ParseTraceLevelError(s.to_string())),
        }
    }
}

/// Event helpers carried by the analysis services.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer {
    level: TraceLevel,
}

impl Tracer {
    pub fn new(level: TraceLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> TraceLevel {
        self.level
    }

    pub fn phase(&self, name: &str) {
        if self.level.enables(TraceLevel::Errors) {
            tracing::debug!(phase = name, "phase start");
        }
    }

    pub fn symbol(&self, action: &str, name: &str, scope: u32) {
        if self.level.enables(TraceLevel::Symbols) {
            tracing::debug!(action, symbol = name, scope, "symbol");
        }
    }

    pub fn scope(&self, action: &str, kind: &str, id: u32) {
        if self.level.enables(TraceLevel::Scopes) {
            tracing::debug!(action, kind, id, "scope");
        }
    }

    pub fn node(&self, kind: &str, span: nox_syntax::Span) {
        if self.level.enables(TraceLevel::Nodes) {
            tracing::trace!(kind, %span, "visit");
        }
    }

    pub fn error(&self, what: &str, detail: &str) {
        if self.level.enables(TraceLevel::Errors) {
            tracing::error!(what, detail, "analysis invariant violated");
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.level.enables(TraceLevel::Verbose) {
            tracing::trace!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(TraceLevel::Verbose.enables(TraceLevel::Symbols));
        assert!(TraceLevel::Scopes.enables(TraceLevel::Scopes));
        assert!(!TraceLevel::Off.enables(TraceLevel::Errors));
        assert!(!TraceLevel::Symbols.enables(TraceLevel::Nodes));
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("scopes".parse(), Ok(TraceLevel::Scopes));
        assert_eq!("VERBOSE".parse(), Ok(TraceLevel::Verbose));
        assert!("everything".parse::<TraceLevel>().is_err());
    }
}
