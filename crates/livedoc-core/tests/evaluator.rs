//! Heuristic evaluator on realistic drafts.

use livedoc_core::{
    extract, render_template, structure, ExecutionResult, HeuristicEvaluator, HeuristicPolicy,
    QualityEvaluator, SnippetRun, ACTIONABLE_SCORE,
};

const DIFF: &str = "\
diff --git a/src/example.py b/src/example.py
--- a/src/example.py
+++ b/src/example.py
@@ -1,3 +1,5 @@
 def greet(name):
-    print('hi')
+    message = f'Hello, {name}!'
+    print(message)
+    return message
";

fn runs_with(doc: &str, success: bool) -> Vec<SnippetRun> {
    extract(doc, &structure(DIFF))
        .into_iter()
        .map(|snippet| SnippetRun {
            snippet,
            execution_result: Some(if success {
                ExecutionResult::completed(0, "", None)
            } else {
                ExecutionResult::failed("Failed to create sandbox")
            }),
        })
        .collect()
}

#[tokio::test]
async fn test_template_draft_clears_default_gate() {
    let doc = render_template(&structure(DIFF));
    let evaluator = HeuristicEvaluator::default();

    let passing = runs_with(&doc, true);
    let failing = runs_with(&doc, false);
    let good = evaluator
        .evaluate(&doc, None, Some(passing.as_slice()))
        .await
        .unwrap();
    let bad = evaluator
        .evaluate(&doc, None, Some(failing.as_slice()))
        .await
        .unwrap();

    assert!(good.overall_score() > bad.overall_score());
    assert!(good.accuracy_score() > bad.accuracy_score());
    assert_eq!(good.tone_score(), bad.tone_score());
    assert!(bad.overall_score() >= 0.7, "{}", bad.overall_score());
    assert!(bad.issues().iter().any(|i| i.contains("inaccuracies")));
}

#[tokio::test]
async fn test_casual_prose_is_flagged() {
    let evaluator = HeuristicEvaluator::default();
    let result = evaluator
        .evaluate("yeah this kinda works, gonna clean it up", None, None)
        .await
        .unwrap();

    assert!(result.tone_score() < ACTIONABLE_SCORE);
    assert!(result.clarity_score() >= ACTIONABLE_SCORE);
    assert_eq!(result.issues(), ["Tone may not be appropriate".to_string()]);
    assert!(result.overall_score() <= 1.0);
}

#[tokio::test]
async fn test_policy_overrides_change_scores() {
    let strict = HeuristicEvaluator::new(HeuristicPolicy {
        accuracy_base: 0.2,
        tone_base: 0.2,
        clarity_base: 0.2,
        ..HeuristicPolicy::default()
    });
    let result = strict.evaluate("plain text", None, None).await.unwrap();
    assert!(result.overall_score() < 0.3);
    assert_eq!(result.issues().len(), 3);
    assert_eq!(result.feedback().len(), 3);
}

#[tokio::test]
async fn test_batch_keeps_document_order() {
    let evaluator = HeuristicEvaluator::default();
    let docs = vec![
        "plain".to_string(),
        render_template(&structure(DIFF)),
        "yeah".to_string(),
    ];
    let results = evaluator.evaluate_batch(&docs).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[1].clarity_score() > results[0].clarity_score());
    assert!(results[2].tone_score() < results[0].tone_score());
}
