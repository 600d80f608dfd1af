//! The four analysis phases, in execution order: symbol collection,
//! symbol resolution, type validation, semantic validation. Each phase
//! re-walks the same AST; state threads through the shared [`Services`]
//! bundle rather than being rebuilt.

mod collect;
mod resolve;
mod typecheck;
mod validate;

#[cfg(test)]
pub(crate) mod testutil;

#[cfg(test)]
mod collect_tests;
#[cfg(test)]
mod typecheck_tests;
#[cfg(test)]
mod validate_tests;

pub(crate) use collect::run as run_collection;
pub(crate) use resolve::run as run_resolution;
pub(crate) use typecheck::run as run_type_validation;
pub(crate) use validate::run as run_semantic_validation;

use rustc_hash::FxHashMap;

use crate::context::ContextTracker;
use crate::diagnostics::Diagnostics;
use crate::eval::ExpressionEvaluator;
use crate::scope::{ScopeId, ScopeManager};
use crate::trace::{TraceLevel, Tracer};
use crate::types::TypeInference;

/// Mutable analysis state shared by every phase: one instance per run,
/// passed by reference to each phase entry point.
pub(crate) struct Services {
    pub scopes: ScopeManager,
    pub tracker: ContextTracker,
    pub diagnostics: Diagnostics,
    pub evaluator: ExpressionEvaluator,
    pub inference: TypeInference,
    /// Module name to its Module scope, filled by collection.
    pub module_scopes: FxHashMap<String, ScopeId>,
    pub tracer: Tracer,
}

impl Services {
    pub fn new(trace: TraceLevel, strict: bool, max_errors: Option<usize>) -> Self {
        let tracer = Tracer::new(trace);
        Self {
            scopes: ScopeManager::new(tracer),
            tracker: ContextTracker::new(tracer),
            diagnostics: Diagnostics::with_policy(strict, max_errors),
            evaluator: ExpressionEvaluator::new(),
            inference: TypeInference::new(),
            module_scopes: FxHashMap::default(),
            tracer,
        }
    }

    /// Point the tracker and diagnostic defaults at `module`.
    pub fn enter_module(&mut self, name: &str, path: &str) {
        self.tracker.set_module(name, path);
        self.diagnostics.set_ambient_module(Some(name), Some(path));
    }

    pub fn leave_module(&mut self) {
        self.diagnostics.set_ambient_module(None, None);
        self.diagnostics.set_ambient_span(None);
    }
}
