//! Property-based tests for reasoning sessions
//!
//! Whatever the endpoint returns, a session must:
//! - terminate, ending with exactly one Final Answer step
//! - grow by exactly one step per snapshot
//! - report a total time equal to the sum of its step times
//! - never exceed the step cap or call the endpoint after a failure

use super::testing::MockLlmClient;
use super::*;
use crate::llm::LlmError;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum Reply {
    Step { title: String, final_answer: bool },
    Raw(String),
    Fail(String),
}

fn arb_reply() -> impl Strategy<Value = Reply> {
    prop_oneof![
        6 => ("[a-z ]{1,20}", any::<bool>())
            .prop_map(|(title, final_answer)| Reply::Step { title, final_answer }),
        2 => "[a-zA-Z0-9 .!?]{0,40}".prop_map(Reply::Raw),
        1 => "[a-z ]{1,20}".prop_map(Reply::Fail),
    ]
}

fn arb_limits() -> impl Strategy<Value = SessionLimits> {
    (1u32..20).prop_map(|max_steps| SessionLimits {
        max_steps,
        ..SessionLimits::default()
    })
}

fn mock_with(replies: &[Reply]) -> Arc<MockLlmClient> {
    let mock = MockLlmClient::new("prop-model");
    for reply in replies {
        match reply {
            Reply::Step { title, final_answer } => mock.queue_step(
                title,
                "content",
                if *final_answer { "final_answer" } else { "continue" },
            ),
            Reply::Raw(text) => mock.queue_text(text.clone()),
            Reply::Fail(message) => mock.queue_error(LlmError::server_error(message.clone())),
        }
    }
    Arc::new(mock)
}

fn collect(reasoner: &Reasoner) -> Vec<SessionResult> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(reasoner.stream_session("prop prompt").collect())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_session_terminates_with_final_answer(
        replies in proptest::collection::vec(arb_reply(), 0..25),
        limits in arb_limits(),
    ) {
        let mock = mock_with(&replies);
        let snapshots = collect(&Reasoner::new(mock.clone(), limits));

        prop_assert!(!snapshots.is_empty());
        let last = snapshots.last().unwrap();
        prop_assert!(last.final_answer().is_some());
        let finals = last.steps.iter().filter(|s| s.is_final_answer()).count();
        prop_assert_eq!(finals, 1);

        let cap = usize::try_from(limits.max_steps).unwrap();
        prop_assert!(last.steps.len() <= cap + 1);
        prop_assert!(mock.call_count() <= cap + 1);
    }

    #[test]
    fn prop_snapshots_grow_by_one(
        replies in proptest::collection::vec(arb_reply(), 0..25),
        limits in arb_limits(),
    ) {
        let snapshots = collect(&Reasoner::new(mock_with(&replies), limits));

        for (i, snapshot) in snapshots.iter().enumerate() {
            prop_assert_eq!(snapshot.steps.len(), i + 1);
            let label = &snapshot.steps[i].label;
            if i + 1 < snapshots.len() {
                let expected_prefix = format!("Step {}: ", i + 1);
                prop_assert!(label.starts_with(&expected_prefix));
            } else {
                prop_assert_eq!(label.as_str(), FINAL_ANSWER_LABEL);
            }
        }
    }

    #[test]
    fn prop_total_time_is_sum_of_steps(
        replies in proptest::collection::vec(arb_reply(), 0..25),
    ) {
        let snapshots = collect(&Reasoner::new(mock_with(&replies), SessionLimits::default()));

        let mut previous = Duration::ZERO;
        for snapshot in &snapshots {
            let sum: Duration = snapshot.steps.iter().map(|s| s.elapsed).sum();
            prop_assert_eq!(snapshot.total_elapsed, sum);
            prop_assert!(snapshot.total_elapsed >= previous);
            previous = snapshot.total_elapsed;
        }
    }

    #[test]
    fn prop_no_calls_after_failure(
        replies in proptest::collection::vec(arb_reply(), 0..25),
    ) {
        let mock = mock_with(&replies);
        let snapshots = collect(&Reasoner::new(mock.clone(), SessionLimits::default()));
        let last = snapshots.last().unwrap();

        let error_label = format!(": {ERROR_TITLE}");
        if let Some(pos) = last.steps.iter().position(|s| s.label.ends_with(&error_label)) {
            // The failing step is the last intermediate one and no final call was made
            prop_assert_eq!(pos + 2, last.steps.len());
            prop_assert_eq!(mock.call_count(), pos + 1);
        }
    }

    #[test]
    fn prop_raw_text_is_preserved(
        text in "[a-zA-Z .!?]{1,40}",
    ) {
        let mock = MockLlmClient::new("prop-model");
        mock.queue_text(text.clone());
        mock.queue_step("Next", "content", "final_answer");
        mock.queue_text("answer");

        let snapshots = collect(&Reasoner::new(Arc::new(mock), SessionLimits::default()));
        let first = &snapshots[0].steps[0];
        prop_assert_eq!(first.label.as_str(), "Step 1: Raw Response");
        prop_assert_eq!(&first.content, &text);
    }
}
