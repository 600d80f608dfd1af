//! Semantic analysis for the Nox language.
//!
//! Takes the parsed [`Program`](nox_syntax::Program) and runs four
//! phases over it in a fixed order:
//!
//! 1. collection - build the scope tree and define every symbol
//! 2. resolution - wire identifiers, imports, and type references
//! 3. type validation - annotations, signatures, constant folding
//! 4. semantic validation - entry point, unused symbols, import cycles
//!
//! The only entry point most hosts need is [`Analyzer::analyze`]; the
//! scope, diagnostic, and evaluation modules are public for tooling that
//! wants to inspect the analysis state directly.

pub mod analyzer;
pub mod context;
pub mod diagnostics;
pub mod eval;
pub mod scope;
pub mod trace;
pub mod types;

mod phases;

pub use analyzer::{AnalysisResult, Analyzer, AnalyzerConfig};
pub use context::Phase;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use trace::TraceLevel;
