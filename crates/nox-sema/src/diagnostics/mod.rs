//! Diagnostics collection and deduplication.
//!
//! Diagnostics are append-only while a phase runs; `get()` is the read
//! side and is where duplicate reports of the same underlying issue are
//! collapsed. Missing module/context metadata is filled in from the
//! ambient analysis position at push time.

mod code;

#[cfg(test)]
mod dedup_tests;

use nox_syntax::Span;
use serde::{Deserialize, Serialize};

pub use code::{DiagnosticCode, Severity};

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Span of the whole construct the issue sits in.
    pub context_span: Option<Span>,
    /// Span of the precise offending token(s).
    pub target_span: Option<Span>,
    pub module_name: Option<String>,
    pub module_path: Option<String>,
    pub fixes: Vec<Fix>,
    pub related: Vec<RelatedInfo>,
}

/// A mechanical fix the caller can apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub replacement: String,
    pub description: String,
}

impl Fix {
    pub fn new(replacement: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            description: description.into(),
        }
    }
}

/// Secondary span attached to a diagnostic (prior declaration, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

impl RelatedInfo {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Position metadata the manager stamps onto diagnostics that omit it.
#[derive(Debug, Clone, Default)]
struct Ambient {
    module_name: Option<String>,
    module_path: Option<String>,
    context_span: Option<Span>,
}

/// Collects diagnostics across all phases of one analysis run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    ambient: Ambient,
    strict: bool,
    max_errors: Option<usize>,
    /// Set once the error ceiling is hit; the analyzer stops at the next
    /// phase boundary.
    limit_hit: bool,
}

#[must_use = "diagnostic not recorded, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    entry: Diagnostic,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(strict: bool, max_errors: Option<usize>) -> Self {
        Self {
            strict,
            max_errors,
            ..Self::default()
        }
    }

    /// Update the module stamped onto span-less diagnostics.
    pub fn set_ambient_module(&mut self, name: Option<&str>, path: Option<&str>) {
        self.ambient.module_name = name.map(str::to_owned);
        self.ambient.module_path = path.map(str::to_owned);
    }

    /// Update the context span stamped onto diagnostics that omit one.
    pub fn set_ambient_span(&mut self, span: Option<Span>) {
        self.ambient.context_span = span;
    }

    /// Start a diagnostic with the code's default message and severity.
    pub fn report(&mut self, code: DiagnosticCode) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            entry: Diagnostic {
                code,
                severity: code.default_severity(),
                message: code.fallback_message().to_string(),
                context_span: None,
                target_span: None,
                module_name: None,
                module_path: None,
                fixes: Vec::new(),
                related: Vec::new(),
            },
            diagnostics: self,
        }
    }

    fn push(&mut self, mut entry: Diagnostic) {
        // Fill gaps from the ambient position before any policy check.
        if entry.module_name.is_none() {
            entry.module_name = self.ambient.module_name.clone();
            entry.module_path = self.ambient.module_path.clone();
        }
        if entry.context_span.is_none() {
            entry.context_span = self.ambient.context_span.or(entry.target_span);
        }

        if entry.severity == Severity::Error {
            if self.strict && self.has_errors() {
                return;
            }
            if let Some(max) = self.max_errors
                && self.error_count() >= max
            {
                self.limit_hit = true;
                return;
            }
        }
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Whether the hard error ceiling was reached.
    pub fn at_error_limit(&self) -> bool {
        self.limit_hit
    }

    /// Errors recorded since the given watermark, for per-phase failure checks.
    pub fn errors_since(&self, watermark: usize) -> usize {
        self.entries[watermark.min(self.entries.len())..]
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Raw append-order access, duplicates included.
    pub fn raw(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Read out diagnostics with duplicates of the same issue collapsed.
    ///
    /// When two entries report the same issue, the more specific one wins:
    /// higher code priority, then longer message, then larger context
    /// span, then higher severity. A merge can produce a winner with a
    /// wider target than the entry it displaced, so each winner is folded
    /// against the kept set until it collides with nothing.
    pub fn get(&self) -> Vec<Diagnostic> {
        let mut kept: Vec<Diagnostic> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let mut winner = entry.clone();
            while let Some(pos) = kept.iter().position(|k| same_issue(k, &winner)) {
                let existing = kept.remove(pos);
                if more_specific(&existing, &winner) {
                    winner = existing;
                }
            }
            kept.push(winner);
        }
        kept
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Supply detail text, rendered through the code's message template.
    pub fn message(mut self, detail: impl AsRef<str>) -> Self {
        self.entry.message = self.entry.code.message(Some(detail.as_ref()));
        self
    }

    /// Replace the message verbatim, bypassing the template.
    pub fn raw_message(mut self, message: impl Into<String>) -> Self {
        self.entry.message = message.into();
        self
    }

    pub fn context(mut self, span: Span) -> Self {
        self.entry.context_span = Some(span);
        self
    }

    pub fn target(mut self, span: Span) -> Self {
        self.entry.target_span = Some(span);
        self
    }

    pub fn module(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.entry.module_name = Some(name.into());
        self.entry.module_path = Some(path.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.entry.severity = severity;
        self
    }

    pub fn fix(mut self, replacement: impl Into<String>, description: impl Into<String>) -> Self {
        self.entry.fixes.push(Fix::new(replacement, description));
        self
    }

    pub fn related_to(mut self, span: Span, message: impl Into<String>) -> Self {
        self.entry.related.push(RelatedInfo::new(span, message));
        self
    }

    pub fn emit(self) {
        self.diagnostics.push(self.entry);
    }
}

/// Whether two diagnostics report the same underlying issue.
fn same_issue(a: &Diagnostic, b: &Diagnostic) -> bool {
    if a.code.is_always_distinct() || b.code.is_always_distinct() {
        return false;
    }

    if let (Some(ta), Some(tb)) = (a.target_span, b.target_span)
        && ta.overlaps(tb)
    {
        // Known cascade pairs, a shared quoted identifier, and the
        // duplicate/shadowing family are the recognized collisions.
        if a.code.cascades_from(b.code) || b.code.cascades_from(a.code) {
            return true;
        }
        if let (Some(na), Some(nb)) = (quoted_name(&a.message), quoted_name(&b.message))
            && na == nb
        {
            return true;
        }
        if a.code.is_duplicate_family() && b.code.is_duplicate_family() {
            return true;
        }
        // Overlapping targets collapse even without a recognized relation.
        return true;
    }

    match (a.context_span, b.context_span) {
        (Some(ca), Some(cb)) => ca == cb && a.code.is_type_error() && b.code.is_type_error(),
        _ => false,
    }
}

/// Whether `a` should replace `b` when both report the same issue.
fn more_specific(a: &Diagnostic, b: &Diagnostic) -> bool {
    let pa = a.code.priority();
    let pb = b.code.priority();
    if pa != pb {
        return pa > pb;
    }
    if a.message.len() != b.message.len() {
        return a.message.len() > b.message.len();
    }
    let ca = a.context_span.map_or(0, Span::len);
    let cb = b.context_span.map_or(0, Span::len);
    if ca != cb {
        return ca > cb;
    }
    a.severity > b.severity
}

/// First backtick-quoted identifier in a message, if any.
fn quoted_name(message: &str) -> Option<&str> {
    let start = message.find('`')? + 1;
    let rest = &message[start..];
    let end = rest.find('`')?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}
