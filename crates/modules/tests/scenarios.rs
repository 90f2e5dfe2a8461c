//! End-to-end lab scenarios.
//!
//! Each test loads a module from the catalog and plays a user through it:
//! - Full runs answered from the expected table, in topological order
//! - Wrong and malformed answers along the way
//! - Gating of joins in the attention labs
//! - Reset and snapshot behaviour

use approx::assert_relative_eq;
use matrixlab_core::{LabConfig, LabError, StepState, Verdict};
use matrixlab_modules::{catalog, load, LabSession, ModuleError};

fn open(slug: &str) -> LabSession {
    LabSession::with_defaults(load(slug).unwrap()).unwrap()
}

fn expected_cells(session: &LabSession, step: &str) -> Vec<f64> {
    let key = session
        .gate()
        .graph()
        .step(step)
        .and_then(|s| s.expects.clone())
        .unwrap();
    session
        .module()
        .calculate_expected(&key)
        .unwrap()
        .data()
        .to_vec()
}

fn answer(session: &mut LabSession, step: &str) -> Verdict {
    let mut verdict = Verdict::Incorrect;
    for value in expected_cells(session, step) {
        verdict = session.submit(step, &format!("{}", value)).unwrap();
    }
    verdict
}

/// Answer every step in dependency order.
fn play_through(session: &mut LabSession) {
    session.begin().unwrap();
    let order: Vec<String> = session
        .gate()
        .graph()
        .topological_order()
        .into_iter()
        .map(String::from)
        .collect();
    for step in order {
        if session.gate().is_completed(&step) {
            continue;
        }
        assert_eq!(answer(session, &step), Verdict::Completed, "{}", step);
    }
}

// ============================================================================
// Full Runs
// ============================================================================

#[test]
fn test_every_module_can_be_finished() {
    for slug in catalog() {
        let mut session = open(slug);
        play_through(&mut session);
        assert!(session.is_finished(), "{} not finished", slug);
        assert_relative_eq!(session.progress(), 1.0);
    }
}

#[test]
fn test_answers_within_tolerance_are_accepted() {
    let mut session = open("linear-regression");
    session.begin().unwrap();
    // 14.0 expected; 0.009 off is inside the strict 0.01 bound.
    assert_eq!(
        session.submit("prediction-calc", "14.009").unwrap(),
        Verdict::Advanced { row: 1, col: 0 }
    );
    // 21.0 expected; exactly 0.01 off is rejected.
    assert_eq!(
        session.submit("prediction-calc", "21.01").unwrap(),
        Verdict::Incorrect
    );
    assert_eq!(
        session.submit("prediction-calc", " 21 ").unwrap(),
        Verdict::Advanced { row: 2, col: 0 }
    );
}

#[test]
fn test_configured_tolerance() {
    let config = LabConfig::from_toml_str("[validation]\ntolerance = 0.5\n").unwrap();
    let mut session = LabSession::new(load("linear-regression").unwrap(), &config).unwrap();
    session.begin().unwrap();
    assert_eq!(
        session.submit("prediction-calc", "14.4").unwrap(),
        Verdict::Advanced { row: 1, col: 0 }
    );
}

// ============================================================================
// Gating
// ============================================================================

#[test]
fn test_regression_branches_after_loss() {
    let mut session = open("logistic-regression");
    session.begin().unwrap();
    for step in ["linear-calc", "sigmoid-calc", "loss-calc"] {
        answer(&mut session, step);
    }
    assert_eq!(
        session.focus(),
        vec!["grad-weights-calc".to_string(), "grad-bias-calc".to_string()]
    );
    assert_eq!(session.gate().state("update-weights"), StepState::Locked);
    answer(&mut session, "grad-weights-calc");
    assert_eq!(session.gate().state("update-weights"), StepState::Unlocked);
    assert_eq!(session.gate().state("update-bias"), StepState::Locked);
}

#[test]
fn test_rnn_h1_gradient_needs_both_paths() {
    let mut session = open("rnn");
    session.begin().unwrap();
    for step in [
        "t1_calc_h",
        "t1_calc_y",
        "t1_pred",
        "t2_calc_h",
        "t2_calc_y",
        "t2_pred",
        "loss_calculation",
        "grad_pred1",
        "grad_y1",
    ] {
        assert_eq!(answer(&mut session, step), Verdict::Completed, "{}", step);
    }
    assert_eq!(
        session.submit("grad_h1", "0"),
        Err(ModuleError::Workflow(LabError::StepLocked {
            step: "grad_h1".to_string(),
            waiting_on: vec!["grad_h2".to_string()],
        }))
    );
    for step in ["grad_pred2", "grad_y2", "grad_h2"] {
        answer(&mut session, step);
    }
    assert!(session.gate().is_enabled("grad_h1"));
    assert_eq!(session.focus(), vec!["grad_h1".to_string()]);
}

#[test]
fn test_attention_join_waits_for_every_input() {
    let mut session = open("multi-head-latent-attention");
    assert_eq!(
        session.gate().unlocked(),
        vec!["calc_q", "calc_c_kv"]
    );
    answer(&mut session, "calc_c_kv");
    answer(&mut session, "calc_k");
    answer(&mut session, "calc_v");
    assert_eq!(session.gate().state("attention-summary"), StepState::Locked);
    answer(&mut session, "calc_q");
    assert_eq!(session.gate().state("attention-summary"), StepState::Unlocked);
    // No focus map in the attention labs.
    assert!(session.focus().is_empty());
}

#[test]
fn test_cnn_chain_with_wrong_answers() {
    let mut session = open("cnn");
    assert_eq!(session.submit("convolution", "30").unwrap(), Verdict::Incorrect);
    assert!(matches!(
        session.submit("convolution", ""),
        Err(ModuleError::Workflow(LabError::InvalidUserInput { .. }))
    ));
    assert_eq!(answer(&mut session, "convolution"), Verdict::Completed);
    assert_eq!(session.focus(), vec!["relu".to_string()]);
    assert_eq!(session.gate().state("pooling"), StepState::Locked);
}

// ============================================================================
// Reset and Snapshots
// ============================================================================

#[test]
fn test_reset_returns_focus_to_entry() {
    let mut session = open("rnn");
    play_through(&mut session);
    session.reset();
    assert_eq!(session.focus(), vec!["intro-rnn".to_string()]);
    assert_eq!(session.gate().unlocked(), vec!["intro-rnn"]);
    assert_eq!(session.progress(), 0.0);
    assert_eq!(session.grid("t1_calc_h").unwrap().correct_count(), 0);
}

#[test]
fn test_snapshot_tracks_pooling_window() {
    let mut session = open("cnn");
    answer(&mut session, "convolution");
    answer(&mut session, "relu");
    session.submit("pooling", "30").unwrap();

    let snapshot = session.snapshot();
    let pooling = snapshot.step("pooling").unwrap();
    assert_eq!(pooling.active_cell, Some((0, 1)));
    assert_eq!(pooling.highlight, vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    assert_eq!(snapshot.completed, vec!["convolution".to_string(), "relu".to_string()]);
    assert_relative_eq!(snapshot.progress, 0.4);
}

#[test]
fn test_expected_table_export() {
    let module = load("linear-regression").unwrap();
    let json: serde_json::Value = serde_json::from_str(&module.expected_json().unwrap()).unwrap();
    assert_eq!(json["loss"], serde_json::json!([[6.65]]));
    assert_eq!(json["update-bias"], serde_json::json!([[2.042]]));
    assert_eq!(json.as_object().unwrap().len(), 6);
}
