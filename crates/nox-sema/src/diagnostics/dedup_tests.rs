use nox_syntax::Span;

use super::{DiagnosticCode, Diagnostics, Severity};

#[test]
fn builder_uses_message_template() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("foo")
        .target(Span::new(0, 3))
        .emit();

    let out = diag.get();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].message, "`foo` is not defined");
    assert_eq!(out[0].severity, Severity::Error);
}

#[test]
fn ambient_module_fills_missing_metadata() {
    let mut diag = Diagnostics::new();
    diag.set_ambient_module(Some("main"), Some("main.nx"));
    diag.report(DiagnosticCode::TypeMismatch)
        .target(Span::new(4, 8))
        .emit();

    let out = diag.get();
    assert_eq!(out[0].module_name.as_deref(), Some("main"));
    assert_eq!(out[0].module_path.as_deref(), Some("main.nx"));
    // Context falls back to the target span when no ambient span is set.
    assert_eq!(out[0].context_span, Some(Span::new(4, 8)));
}

#[test]
fn overlapping_targets_collapse_to_most_specific() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticCode::TypeMismatch)
        .target(Span::new(10, 20))
        .emit();
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("x")
        .target(Span::new(12, 13))
        .emit();

    let out = diag.get();
    assert_eq!(out.len(), 1);
    // UndefinedIdentifier outranks TypeMismatch in the priority table.
    assert_eq!(out[0].code, DiagnosticCode::UndefinedIdentifier);
}

#[test]
fn always_distinct_codes_never_merge() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticCode::ImportCircularDependency)
        .target(Span::new(0, 5))
        .emit();
    diag.report(DiagnosticCode::ImportCircularDependency)
        .target(Span::new(0, 5))
        .emit();

    assert_eq!(diag.get().len(), 2);
}

#[test]
fn type_errors_with_same_context_collapse() {
    let mut diag = Diagnostics::new();
    diag.set_ambient_span(Some(Span::new(0, 40)));
    diag.report(DiagnosticCode::TypeMismatch)
        .raw_message("type mismatch: expected i32")
        .emit();
    diag.report(DiagnosticCode::ReturnTypeMismatch).emit();

    let out = diag.get();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].code, DiagnosticCode::ReturnTypeMismatch);
}

#[test]
fn disjoint_targets_stay_separate() {
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("a")
        .target(Span::new(0, 1))
        .emit();
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("b")
        .target(Span::new(5, 6))
        .emit();

    assert_eq!(diag.get().len(), 2);
}

#[test]
fn strict_mode_drops_errors_after_the_first() {
    let mut diag = Diagnostics::with_policy(true, None);
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("a")
        .target(Span::new(0, 1))
        .emit();
    diag.report(DiagnosticCode::UndefinedIdentifier)
        .message("b")
        .target(Span::new(5, 6))
        .emit();
    // Warnings still land.
    diag.report(DiagnosticCode::UnusedVariable)
        .message("c")
        .target(Span::new(9, 10))
        .emit();

    assert_eq!(diag.error_count(), 1);
    assert_eq!(diag.warning_count(), 1);
}

#[test]
fn error_ceiling_sets_limit_flag() {
    let mut diag = Diagnostics::with_policy(false, Some(2));
    for i in 0..4u32 {
        diag.report(DiagnosticCode::UndefinedIdentifier)
            .message(format!("v{i}"))
            .target(Span::new(i * 10, i * 10 + 1))
            .emit();
    }
    assert_eq!(diag.error_count(), 2);
    assert!(diag.at_error_limit());
}

#[test]
fn a_wide_winner_absorbs_every_narrow_entry_it_bridges() {
    // Two narrow field-level reports, then a wide one spanning both.
    // The wide entry displaces the first; it must then also collapse
    // the second rather than coexist with it.
    let mut diag = Diagnostics::new();
    diag.report(DiagnosticCode::DuplicateFieldInit)
        .message("x")
        .target(Span::new(58, 59))
        .emit();
    diag.report(DiagnosticCode::UnknownField)
        .message("z")
        .target(Span::new(66, 67))
        .emit();
    diag.report(DiagnosticCode::MissingRequiredField)
        .message("y")
        .target(Span::new(44, 74))
        .emit();

    let out = diag.get();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].code, DiagnosticCode::MissingRequiredField);
}

#[test]
fn dedup_never_leaves_same_issue_pairs() {
    // Spot-check the testable property: the read-out set is a fixpoint.
    let mut diag = Diagnostics::new();
    for span in [Span::new(0, 8), Span::new(2, 6), Span::new(4, 10)] {
        diag.report(DiagnosticCode::TypeMismatch).target(span).emit();
    }
    let out = diag.get();
    for (i, a) in out.iter().enumerate() {
        for b in &out[i + 1..] {
            let overlap = match (a.target_span, b.target_span) {
                (Some(x), Some(y)) => x.overlaps(y),
                _ => false,
            };
            assert!(!overlap, "dedup left overlapping duplicates");
        }
    }
}
