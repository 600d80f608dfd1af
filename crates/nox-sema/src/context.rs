//! Cross-phase analysis context.
//!
//! One mutable cursor threaded through every visit: current module,
//! scope, and phase, plus the stacks that make self-reference and
//! forward-reference checks possible. Every recursive descent snapshots
//! stack depths first and truncates back afterward, so a failure inside
//! one subtree can never leak stale entries into its siblings.

use nox_syntax::{Span, TypeNode};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::scope::{ScopeId, SymbolId};
use crate::trace::Tracer;

/// The four analysis phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Collection,
    Resolution,
    TypeValidation,
    SemanticValidation,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Resolution => "resolution",
            Self::TypeValidation => "type-validation",
            Self::SemanticValidation => "semantic-validation",
        }
    }

    pub const ALL: [Phase; 4] = [
        Phase::Collection,
        Phase::Resolution,
        Phase::TypeValidation,
        Phase::SemanticValidation,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What kind of position an expression is being checked in. The
/// checker reads this to recover the expected type without re-walking
/// the tree, which is what lets an anonymous struct literal validate
/// against its annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContextKind {
    VariableInitializer,
    ReturnExpression,
    CallArgument,
    Condition,
    StructFieldValue,
    ThrowValue,
    IndexExpression,
    AssignTarget,
    AssignValue,
    ParameterDefault,
    SwitchScrutinee,
    ArraySize,
}

#[derive(Debug, Clone)]
pub struct ExprContext {
    pub kind: ExprContextKind,
    pub expected: Option<TypeNode>,
    pub depth: usize,
}

/// Sub-phase of a declaration currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclPhase {
    InDeclaration,
    /// The initializer/default-value expression is being visited.
    InInitialization,
}

#[derive(Debug, Clone)]
pub struct DeclRecord {
    pub name: String,
    pub span: Span,
    pub phase: DeclPhase,
    /// Declaration index when the record is a function parameter.
    pub param_index: Option<usize>,
    pub symbol: Option<SymbolId>,
}

/// Depth snapshot taken before a recursive descent.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    span_depth: usize,
    decl_depth: usize,
    expr_depth: usize,
    scope_depth: usize,
    scope: ScopeId,
    module: Option<(String, String)>,
}

/// Per-run mutable analysis cursor.
#[derive(Debug)]
pub struct ContextTracker {
    tracer: Tracer,
    phase: Phase,
    module: Option<(String, String)>,
    scope: ScopeId,

    span_stack: Vec<Span>,
    decl_stack: Vec<DeclRecord>,
    expr_stack: Vec<ExprContext>,
    scope_stack: Vec<ScopeId>,

    /// Names whose declaration is in flight.
    declaring: FxHashSet<String>,
    /// Symbols resolution has already finished with.
    resolved: FxHashSet<SymbolId>,
    /// Forward references seen before their declaration, by name.
    pending_forward: FxHashMap<String, Vec<Span>>,
}

impl ContextTracker {
    pub fn new(tracer: Tracer) -> Self {
        Self {
            tracer,
            phase: Phase::Collection,
            module: None,
            scope: ScopeId::GLOBAL,
            span_stack: Vec::new(),
            decl_stack: Vec::new(),
            expr_stack: Vec::new(),
            scope_stack: Vec::new(),
            declaring: FxHashSet::default(),
            resolved: FxHashSet::default(),
            pending_forward: FxHashMap::default(),
        }
    }

    /// Clear everything phase-local and record the new phase.
    pub fn reset_for_phase(&mut self, phase: Phase) {
        self.tracer.phase(phase.name());
        self.phase = phase;
        self.module = None;
        self.scope = ScopeId::GLOBAL;
        self.span_stack.clear();
        self.decl_stack.clear();
        self.expr_stack.clear();
        self.scope_stack.clear();
        self.declaring.clear();
        self.resolved.clear();
        self.pending_forward.clear();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_module(&mut self, name: &str, path: &str) {
        self.module = Some((name.to_string(), path.to_string()));
    }

    pub fn module_name(&self) -> Option<&str> {
        self.module.as_ref().map(|(n, _)| n.as_str())
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module.as_ref().map(|(_, p)| p.as_str())
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn set_scope(&mut self, scope: ScopeId) {
        self.scope = scope;
    }

    pub fn push_scope(&mut self, scope: ScopeId) {
        self.scope_stack.push(self.scope);
        self.scope = scope;
    }

    pub fn pop_scope(&mut self) {
        if let Some(prev) = self.scope_stack.pop() {
            self.scope = prev;
        } else {
            self.tracer.error("scope stack", "pop on empty stack");
            self.scope = ScopeId::GLOBAL;
        }
    }

    // ===== checkpoint / restore =====

    /// Snapshot stack depths plus current scope/module.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            span_depth: self.span_stack.len(),
            decl_depth: self.decl_stack.len(),
            expr_depth: self.expr_stack.len(),
            scope_depth: self.scope_stack.len(),
            scope: self.scope,
            module: self.module.clone(),
        }
    }

    /// Truncate every stack back to the checkpointed depth. A stack that
    /// shrank below its saved depth means some visit popped past its own
    /// frame; that is corruption, so the stack is reset to empty and the
    /// incident logged.
    pub fn restore(&mut self, cp: Checkpoint) {
        truncate_or_reset(&mut self.span_stack, cp.span_depth, "span stack", &self.tracer);
        truncate_or_reset(&mut self.decl_stack, cp.decl_depth, "declaration stack", &self.tracer);
        truncate_or_reset(&mut self.expr_stack, cp.expr_depth, "expression stack", &self.tracer);
        truncate_or_reset(&mut self.scope_stack, cp.scope_depth, "scope stack", &self.tracer);
        self.scope = cp.scope;
        self.module = cp.module;
    }

    /// Run `f` with a checkpoint taken before and restored after,
    /// whatever `f` leaves behind.
    pub fn with_saved<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let cp = self.checkpoint();
        let result = f(self);
        self.restore(cp);
        result
    }

    // ===== context spans =====

    pub fn push_context_span(&mut self, span: Span) {
        self.span_stack.push(span);
    }

    pub fn pop_context_span(&mut self) {
        self.span_stack.pop();
    }

    pub fn current_context_span(&self) -> Option<Span> {
        self.span_stack.last().copied()
    }

    // ===== declaration tracking =====

    pub fn start_declaration(&mut self, name: &str, span: Span, param_index: Option<usize>) {
        self.declaring.insert(name.to_string());
        self.decl_stack.push(DeclRecord {
            name: name.to_string(),
            span,
            phase: DeclPhase::InDeclaration,
            param_index,
            symbol: None,
        });
    }

    /// Mark the topmost record for `name` as having entered its
    /// initializer expression.
    pub fn start_initialization(&mut self, name: &str) {
        if let Some(record) = self
            .decl_stack
            .iter_mut()
            .rev()
            .find(|r| r.name == name)
        {
            record.phase = DeclPhase::InInitialization;
        }
    }

    pub fn complete_declaration(&mut self, name: &str, symbol: Option<SymbolId>) {
        if let Some(pos) = self.decl_stack.iter().rposition(|r| r.name == name) {
            self.decl_stack.remove(pos);
        }
        if let Some(symbol) = symbol {
            self.resolved.insert(symbol);
        }
        self.declaring.remove(name);
    }

    pub fn is_declaring(&self, name: &str) -> bool {
        self.declaring.contains(name)
    }

    /// `let x = x;` detection: a hit requires the name to be on the
    /// declaration stack *and* inside its initializer.
    pub fn check_self_reference(&self, name: &str) -> Option<Span> {
        self.decl_stack
            .iter()
            .rev()
            .find(|r| r.name == name && r.phase == DeclPhase::InInitialization)
            .map(|r| r.span)
    }

    /// Index of the parameter whose default value is being visited.
    pub fn current_param_index(&self) -> Option<usize> {
        self.decl_stack
            .iter()
            .rev()
            .find(|r| r.phase == DeclPhase::InInitialization)
            .and_then(|r| r.param_index)
    }

    /// `fn f(a = b, b: i32)` detection: referencing a parameter declared
    /// after the one currently being initialized.
    pub fn check_parameter_forward_reference(&self, referenced_index: usize) -> bool {
        match self.current_param_index() {
            Some(current) => referenced_index > current,
            None => false,
        }
    }

    // ===== expression contexts =====

    pub fn push_expr_context(&mut self, kind: ExprContextKind, expected: Option<TypeNode>) {
        let depth = self.expr_stack.len();
        self.expr_stack.push(ExprContext {
            kind,
            expected,
            depth,
        });
    }

    pub fn pop_expr_context(&mut self) {
        self.expr_stack.pop();
    }

    pub fn current_expr_context(&self) -> Option<&ExprContext> {
        self.expr_stack.last()
    }

    /// Expected type recorded for the innermost expression position.
    /// Outer frames never apply: a call argument with an unknown
    /// parameter type masks the initializer annotation around it.
    pub fn expected_type(&self) -> Option<&TypeNode> {
        self.expr_stack.last()?.expected.as_ref()
    }

    // ===== resolution bookkeeping =====

    pub fn mark_resolved(&mut self, symbol: SymbolId) {
        self.resolved.insert(symbol);
    }

    pub fn is_resolved(&self, symbol: SymbolId) -> bool {
        self.resolved.contains(&symbol)
    }

    pub fn add_pending_forward(&mut self, name: &str, span: Span) {
        self.pending_forward
            .entry(name.to_string())
            .or_default()
            .push(span);
    }

    /// Remove and return the forward references recorded for `name`.
    pub fn take_pending_forward(&mut self, name: &str) -> Vec<Span> {
        self.pending_forward.remove(name).unwrap_or_default()
    }
}

fn truncate_or_reset<T>(stack: &mut Vec<T>, depth: usize, what: &str, tracer: &Tracer) {
    if stack.len() < depth {
        tracer.error(what, "depth below checkpoint, resetting");
        stack.clear();
    } else {
        stack.truncate(depth);
    }
}
