//! The analysis driver.
//!
//! Runs the four phases in order over a parsed program and packages the
//! outcome: deduplicated diagnostics, how far the run got, and per-phase
//! timings. A strict run stops at the first phase that produced an
//! error; a normal run continues so later phases can still report what
//! they can.

use std::time::{Duration, Instant};

use nox_syntax::Program;

use crate::context::Phase;
use crate::diagnostics::Diagnostic;
use crate::phases::{
    run_collection, run_resolution, run_semantic_validation, run_type_validation, Services,
};
use crate::trace::TraceLevel;

#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub trace: TraceLevel,
    /// Stop after this phase even when no errors occurred.
    pub stop_at_phase: Option<Phase>,
    /// Abort at the end of the first phase that reported an error, and
    /// drop every error after the first within a phase.
    pub strict: bool,
    /// Hard ceiling on reported errors; `None` means unlimited.
    pub max_errors: Option<usize>,
}

/// Outcome of one analysis run.
#[derive(Debug)]
pub struct AnalysisResult {
    /// No errors anywhere; warnings do not affect this.
    pub success: bool,
    /// Deduplicated diagnostics, in first-reported order.
    pub diagnostics: Vec<Diagnostic>,
    pub completed_phase: Option<Phase>,
    pub timings: Vec<(Phase, Duration)>,
    pub total_time: Duration,
}

impl AnalysisResult {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::diagnostics::Severity::Error)
    }
}

#[derive(Debug, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, program: &Program) -> AnalysisResult {
        let mut services = Services::new(
            self.config.trace,
            self.config.strict,
            self.config.max_errors,
        );
        let started = Instant::now();
        let mut timings = Vec::with_capacity(Phase::ALL.len());
        let mut completed = None;

        for phase in Phase::ALL {
            services.tracker.reset_for_phase(phase);
            let watermark = services.diagnostics.len();
            let phase_started = Instant::now();
            match phase {
                Phase::Collection => run_collection(&mut services, program),
                Phase::Resolution => run_resolution(&mut services, program),
                Phase::TypeValidation => run_type_validation(&mut services, program),
                Phase::SemanticValidation => run_semantic_validation(&mut services, program),
            }
            timings.push((phase, phase_started.elapsed()));
            completed = Some(phase);

            if services.diagnostics.at_error_limit() {
                break;
            }
            if self.config.strict && services.diagnostics.errors_since(watermark) > 0 {
                break;
            }
            if self.config.stop_at_phase == Some(phase) {
                break;
            }
        }

        AnalysisResult {
            success: !services.diagnostics.has_errors(),
            diagnostics: services.diagnostics.get(),
            completed_phase: completed,
            timings,
            total_time: started.elapsed(),
        }
    }
}

#[cfg(test)]
mod analyzer_tests;
