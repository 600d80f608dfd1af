//! Phase 4: semantic validation.
//!
//! Whole-program checks that only make sense once every module has been
//! collected, resolved, and type-checked: the entry point contract,
//! unused-symbol sweeps, empty modules, and circular imports.

use nox_syntax::ast::{Primitive, Visibility};
use nox_syntax::{Program, Stmt, TypeNode};
use rustc_hash::FxHashSet;

use super::Services;
use crate::diagnostics::DiagnosticCode;
use crate::scope::{BindingKind, SymbolKind};

pub(crate) fn run(services: &mut Services, program: &Program) {
    check_entry_point(services, program);
    check_import_cycles(services, program);

    for (name, module) in program.iter() {
        services.enter_module(name, &module.path);
        if module.stmts.is_empty() {
            services
                .diagnostics
                .report(DiagnosticCode::EmptyModule)
                .emit();
            continue;
        }
        sweep_unused(services, name);
    }
    services.leave_module();
}

fn check_entry_point(services: &mut Services, program: &Program) {
    let Some(entry) = program.entry_module.as_deref() else {
        return;
    };
    let Some(module) = program.get(entry) else {
        services
            .diagnostics
            .report(DiagnosticCode::EntryModuleNotFound)
            .message(entry)
            .emit();
        return;
    };
    let Some(main) = module.find_function("main") else {
        services
            .diagnostics
            .report(DiagnosticCode::EntryModuleNoMain)
            .module(entry, &module.path)
            .emit();
        return;
    };
    if !main.visibility.is_public() {
        services
            .diagnostics
            .report(DiagnosticCode::EntryModulePrivateMain)
            .module(entry, &module.path)
            .target(main.name.span)
            .emit();
    }
    let valid_return = match &main.ret {
        None => true,
        Some(ty) => matches!(
            ty.as_primitive(),
            Some(Primitive::Void) | Some(Primitive::I32) | Some(Primitive::U8)
        ),
    };
    if !valid_return {
        let span = main.ret.as_ref().map(TypeNode::span).unwrap_or(main.span);
        services
            .diagnostics
            .report(DiagnosticCode::EntryMainInvalidReturn)
            .module(entry, &module.path)
            .target(span)
            .emit();
    }
}

/// Depth-first search over `use` edges. Each distinct cycle is reported
/// once, on the module that closes it.
fn check_import_cycles(services: &mut Services, program: &Program) {
    let mut reported: FxHashSet<Vec<String>> = FxHashSet::default();
    let mut finished: FxHashSet<&str> = FxHashSet::default();

    for (name, _) in program.iter() {
        if finished.contains(name) {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        visit(services, program, name, &mut path, &mut finished, &mut reported);
    }
}

fn visit<'p>(
    services: &mut Services,
    program: &'p Program,
    name: &'p str,
    path: &mut Vec<&'p str>,
    finished: &mut FxHashSet<&'p str>,
    reported: &mut FxHashSet<Vec<String>>,
) {
    if let Some(start) = path.iter().position(|&m| m == name) {
        let cycle: Vec<&str> = path[start..].to_vec();
        if reported.insert(canonical(&cycle)) {
            let mut rendered: Vec<&str> = cycle.clone();
            rendered.push(name);
            services
                .diagnostics
                .report(DiagnosticCode::ImportCircularDependency)
                .message(rendered.join(" -> "))
                .emit();
        }
        return;
    }
    if finished.contains(name) {
        return;
    }
    let Some(module) = program.get(name) else {
        return;
    };

    path.push(name);
    for stmt in &module.stmts {
        if let Stmt::Use(import) = stmt {
            visit(services, program, &import.module.text, path, finished, reported);
        }
    }
    path.pop();
    finished.insert(name);
}

/// Rotation-independent identity for a cycle.
fn canonical(cycle: &[&str]) -> Vec<String> {
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, m)| **m)
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[pivot..]
        .iter()
        .chain(cycle[..pivot].iter())
        .map(|m| m.to_string())
        .collect()
}

fn sweep_unused(services: &mut Services, module: &str) {
    let Some(&root) = services.module_scopes.get(module) else {
        return;
    };

    struct Unused {
        code: DiagnosticCode,
        name: String,
        target: Option<nox_syntax::Span>,
        context: Option<nox_syntax::Span>,
    }
    let mut found: Vec<Unused> = Vec::new();

    for scope in services.scopes.subtree(root) {
        let Some(scope) = services.scopes.scope(scope) else {
            continue;
        };
        for symbol in scope.symbols.values() {
            if symbol.flags.used
                || symbol.binding != BindingKind::Ordinary
                || symbol.name.starts_with('_')
                || symbol.visibility != Visibility::Private
                || symbol.name == "main"
            {
                continue;
            }
            // Imports are exempt: a `use` may exist purely for its
            // side effect on the module graph.
            let code = match symbol.kind {
                SymbolKind::Variable => DiagnosticCode::UnusedVariable,
                SymbolKind::Function => DiagnosticCode::UnusedFunction,
                SymbolKind::Parameter => DiagnosticCode::UnusedParameter,
                SymbolKind::Definition => DiagnosticCode::UnusedDefinition,
                _ => continue,
            };
            found.push(Unused {
                code,
                name: symbol.name.clone(),
                target: symbol.target_span,
                context: symbol.context_span,
            });
        }
    }

    for unused in found {
        let mut builder = services.diagnostics.report(unused.code).message(&unused.name);
        if let Some(span) = unused.target {
            builder = builder.target(span);
        }
        if let Some(span) = unused.context {
            builder = builder.context(span);
        }
        builder.emit();
    }
}
