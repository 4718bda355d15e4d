//! End-to-end behaviour of the reconciler over the whole fallback chain.

use super::schema::*;
use super::*;
use serde_json::json;

fn well_formed() -> Value {
    json!({
        "title": "Projectile Motion",
        "problem": "A ball is thrown at 20 m/s at 30 degrees. Find its range.",
        "given": ["$v_0 = 20$ m/s", "$\\theta = 30^\\circ$", "$g = 9.81$ m/s$^2$"],
        "find": "The horizontal range $R$",
        "principles": ["$R = \\frac{v_0^2 \\sin 2\\theta}{g}$"],
        "steps": [
            {
                "step": 1,
                "description": "Substitute the values",
                "calculation": "$R = \\frac{20^2 \\sin 60^\\circ}{9.81}$",
                "result": "$R \\approx 35.3$ m"
            }
        ],
        "finalAnswer": "$R \\approx 35.3$ m",
        "concept": "Projectile range depends on launch speed and angle."
    })
}

fn assert_shape(breakdown: &ProblemBreakdown) {
    for (i, step) in breakdown.steps.iter().enumerate() {
        assert!(step.step >= 1, "step {} has a non-positive number", i + 1);
    }
    // Round-trips through the renderer's wire shape with every key present.
    let value = serde_json::to_value(breakdown).unwrap();
    for key in [
        "title",
        "problem",
        "given",
        "find",
        "principles",
        "steps",
        "finalAnswer",
        "concept",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert!(value["given"].as_array().unwrap().iter().all(Value::is_string));
    assert!(value["principles"]
        .as_array()
        .unwrap()
        .iter()
        .all(Value::is_string));
}

#[test]
fn well_formed_input_round_trips_unchanged() {
    let input = well_formed();
    let outcome = reconcile(&input.to_string(), "ignored");

    assert!(!outcome.is_degraded());
    assert_eq!(outcome.stage(), ParseStage::Direct);
    assert_eq!(serde_json::to_value(outcome.breakdown()).unwrap(), input);
}

#[test]
fn pretty_printed_input_is_also_direct() {
    let input = serde_json::to_string_pretty(&well_formed()).unwrap();
    let outcome = reconcile(&format!("\n\n  {}  \n", input), "ignored");
    assert_eq!(outcome.stage(), ParseStage::Direct);
    assert!(outcome.degraded_note().is_none());
}

#[test]
fn embedded_object_is_extracted() {
    let raw = format!(
        "Here is your answer:\n{}\nHope that helps!",
        json!({
            "title": "X",
            "problem": "p",
            "given": [],
            "find": "f",
            "principles": [],
            "steps": [],
            "finalAnswer": "a",
            "concept": "c"
        })
    );
    let outcome = reconcile(&raw, "p");

    assert_eq!(outcome.stage(), ParseStage::Extracted);
    assert_eq!(outcome.breakdown().title, "X");
    assert!(!outcome.is_degraded());
}

#[test]
fn single_quotes_and_trailing_commas_are_repaired() {
    let outcome = reconcile("{'title': 'X', 'given': ['a','b',],}", "Find x");

    assert_eq!(outcome.stage(), ParseStage::Repaired);
    let breakdown = outcome.breakdown();
    assert_eq!(breakdown.title, "X");
    assert_eq!(breakdown.given, vec!["a", "b"]);
    // Everything the model left out is defaulted.
    assert_eq!(breakdown.problem, "Find x");
    assert_eq!(breakdown.find, DEFAULT_FIND);
    assert!(breakdown.steps.is_empty());
    assert!(outcome.is_degraded());
}

#[test]
fn unescaped_latex_is_repaired() {
    let raw = r#"{"title": "Roots", "finalAnswer": "$x = \pm\sqrt{2}$"}"#;
    let outcome = reconcile(raw, "Solve x^2 = 2");
    assert_eq!(outcome.stage(), ParseStage::Repaired);
    assert_eq!(outcome.breakdown().final_answer, r"$x = \pm\sqrt{2}$");
}

#[test]
fn prose_falls_back_to_raw_excerpt() {
    let outcome = reconcile("not json at all", "Find x");
    let breakdown = outcome.breakdown();

    assert_eq!(outcome.stage(), ParseStage::Fallback);
    assert_eq!(outcome.defects(), &[Defect::Unparseable]);
    assert_eq!(breakdown.problem, "Find x");
    assert_eq!(breakdown.steps.len(), 1);
    assert_eq!(breakdown.steps[0].step, 1);
    assert!(breakdown.steps[0].calculation.contains("not json at all"));
    assert_eq!(breakdown.steps[0].result, FALLBACK_STEP_RESULT);
    assert!(outcome.degraded_note().unwrap().contains("raw answer"));
}

#[test]
fn fallback_excerpt_is_bounded() {
    let raw = "é".repeat(2_000);
    let outcome = reconcile(&raw, "p");
    let calculation = &outcome.breakdown().steps[0].calculation;
    assert_eq!(calculation.chars().count(), 500 + 3);
    assert!(calculation.ends_with("..."));

    let short = Reconciler::new(ReconcilerConfig { excerpt_limit: 4 }).reconcile("abcdefgh", "p");
    assert_eq!(short.breakdown().steps[0].calculation, "abcd...");
}

#[test]
fn bare_string_step_becomes_positioned_placeholder() {
    let raw = json!({
        "title": "t",
        "steps": [
            {"step": 1, "description": "d", "calculation": "c", "result": "r"},
            "then divide both sides"
        ]
    })
    .to_string();
    let outcome = reconcile(&raw, "p");
    let steps = &outcome.breakdown().steps;

    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].description, "d");
    assert_eq!(steps[1].step, 2);
    assert!(outcome.defects().contains(&Defect::PlaceholderStep {
        position: 2,
        found: "string"
    }));
}

#[test]
fn empty_and_whitespace_input_fall_back() {
    for raw in ["", "   \n\t"] {
        let outcome = reconcile(raw, "Find x");
        assert_eq!(outcome.stage(), ParseStage::Fallback);
        assert_shape(outcome.breakdown());
    }
}

#[test]
fn reconciliation_is_total_over_noise() {
    // xorshift keeps the fixture deterministic without extra crates.
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let alphabet = b"{}[]'\",:\\ \n\tabc123.-";
    for round in 0..300 {
        let len = (next() % 200) as usize;
        let bytes: Vec<u8> = (0..len)
            .map(|_| {
                let r = next();
                if round % 2 == 0 {
                    alphabet[(r % alphabet.len() as u64) as usize]
                } else {
                    r as u8
                }
            })
            .collect();
        let raw = String::from_utf8_lossy(&bytes);
        let outcome = reconcile(&raw, "problem");
        assert_shape(outcome.breakdown());
    }
}

#[test]
fn non_text_payload_is_rejected() {
    let err = reconcile_payload(&json!({"title": "X"}), Some("p")).unwrap_err();
    assert_eq!(err, ReconciliationError::NotText { found: "object" });

    let err = reconcile_payload(&Value::Null, Some("p")).unwrap_err();
    assert_eq!(err, ReconciliationError::NotText { found: "null" });
}

#[test]
fn missing_problem_is_rejected() {
    let err = reconcile_payload(&json!("{}"), None).unwrap_err();
    assert_eq!(err, ReconciliationError::MissingProblem);
}

#[test]
fn text_payload_is_reconciled() {
    let outcome = reconcile_payload(&json!("{\"title\": \"X\"}"), Some("p")).unwrap();
    assert_eq!(outcome.breakdown().title, "X");
    assert_eq!(outcome.breakdown().problem, "p");
}

#[test]
fn degraded_outcome_serializes_with_status_tag() {
    let outcome = reconcile("{\"title\": \"X\"}", "p");
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "degraded");
    assert_eq!(value["stage"], "direct");
    assert_eq!(value["defects"][0]["kind"], "missing_field");
}
