use super::*;
use crate::phases::testutil::*;

fn clean_program() -> Program {
    program(vec![module(
        "main",
        vec![let_stmt("_x", (0, 10), None, Some(int(1, (8, 9))))],
    )])
}

#[test]
fn clean_input_runs_all_four_phases() {
    let result = Analyzer::default().analyze(&clean_program());
    assert!(result.success);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.completed_phase, Some(Phase::SemanticValidation));
    assert_eq!(result.timings.len(), 4);
    let order: Vec<Phase> = result.timings.iter().map(|(p, _)| *p).collect();
    assert_eq!(order, Phase::ALL.to_vec());
}

#[test]
fn strict_mode_stops_at_the_first_failing_phase() {
    let p = program(vec![module(
        "main",
        vec![
            let_stmt("x", (0, 10), None, Some(int(1, (8, 9)))),
            let_stmt("x", (20, 30), None, Some(int(2, (28, 29)))),
        ],
    )]);
    let config = AnalyzerConfig {
        strict: true,
        ..AnalyzerConfig::default()
    };
    let result = Analyzer::new(config).analyze(&p);
    assert!(!result.success);
    assert_eq!(result.completed_phase, Some(Phase::Collection));
    assert_eq!(result.timings.len(), 1);
}

#[test]
fn stop_at_phase_halts_a_clean_run_early() {
    let config = AnalyzerConfig {
        stop_at_phase: Some(Phase::Collection),
        ..AnalyzerConfig::default()
    };
    let result = Analyzer::new(config).analyze(&clean_program());
    assert!(result.success);
    assert_eq!(result.completed_phase, Some(Phase::Collection));
    assert_eq!(result.timings.len(), 1);
}

#[test]
fn the_error_ceiling_cuts_the_run_short() {
    let p = program(vec![module(
        "main",
        vec![
            expr_stmt(ident("aa", (0, 2))),
            expr_stmt(ident("bb", (10, 12))),
        ],
    )]);
    let config = AnalyzerConfig {
        max_errors: Some(1),
        ..AnalyzerConfig::default()
    };
    let result = Analyzer::new(config).analyze(&p);
    assert!(!result.success);
    assert_eq!(result.errors().count(), 1);
    // The ceiling trips during resolution; later phases never run.
    assert_eq!(result.completed_phase, Some(Phase::Resolution));
    assert_eq!(result.timings.len(), 2);
}
