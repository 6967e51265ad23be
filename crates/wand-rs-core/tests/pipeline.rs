//! Batch correction pipeline behaviour against scripted providers.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use wand_rs_config::CorrectionConfig;
use wand_rs_core::{CancellationToken, CorrectionError, CorrectionPipeline, Editor};
use wand_rs_protocol::{
    Completion, CorrectionResult, FinishReason, ProviderError, Record, Role, RunEventPayload,
    SkipReason,
};
use wand_rs_test_utils::{
    CollectingSink, FailingProvider, FixedProvider, GatedProvider, ScriptedProvider,
    TripwireProvider, sample_records,
};

const INSTRUCTION: &str = "fix the street name";

fn incomplete(reason: FinishReason, text: &str) -> Result<Completion, ProviderError> {
    Ok(Completion {
        finish_reason: reason,
        text: text.to_string(),
    })
}

/// One changed record, one marker answer, one cut-off answer.
#[tokio::test]
async fn keeps_only_changed_records_in_source_order() {
    let records = vec![
        Record::new(Role::User, "Ship it to 12 Mian Street"),
        Record::new(Role::Assistant, "Sure."),
        Record::new(Role::Tool, "{\"status\":\"ok\"}"),
    ];
    let provider = ScriptedProvider::new(vec![
        Ok(Completion::stop("  Ship it to 12 Main Street\n")),
        Ok(Completion::stop("heck no brother")),
        incomplete(FinishReason::Length, "partial"),
    ]);
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));

    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");

    assert_eq!(
        results,
        vec![CorrectionResult {
            position: 0,
            role: Role::User,
            content: "Ship it to 12 Mian Street".to_string(),
            amended_text: "Ship it to 12 Main Street".to_string(),
        }]
    );
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn each_prompt_carries_instruction_role_content_and_marker() {
    let records = sample_records();
    let provider = ScriptedProvider::answering(vec!["HECK NO BROTHER"; records.len()]);
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));

    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");
    assert!(results.is_empty());

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), records.len());
    for (prompt, record) in prompts.iter().zip(&records) {
        assert!(prompt.contains(INSTRUCTION));
        assert!(prompt.contains(&format!("Role - {}", record.role)));
        assert!(prompt.contains(&format!("Content - {}", record.content)));
        assert!(prompt.ends_with("respond only with \"HECK NO BROTHER\"."));
    }
}

/// A failure at any record discards everything gathered before it.
#[tokio::test]
async fn failure_midway_yields_no_results() {
    let records = sample_records();
    let provider = ScriptedProvider::new(vec![
        Ok(Completion::stop("amended 0")),
        Ok(Completion::stop("amended 1")),
        Err(ProviderError::Status {
            status: 429,
            body: "rate limited".to_string(),
        }),
        Ok(Completion::stop("never requested")),
    ]);
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));

    let err = pipeline
        .run(&records, INSTRUCTION)
        .await
        .expect_err("run should fail");

    assert!(matches!(
        err,
        CorrectionError::ServiceFailure {
            position: 2,
            source: ProviderError::Status { status: 429, .. }
        }
    ));
    assert_eq!(provider.calls(), 3);
    assert_eq!(provider.remaining(), 1);
}

#[tokio::test]
async fn failure_on_first_record_stops_immediately() {
    let provider = FailingProvider::new();
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));
    let err = pipeline
        .run(&sample_records(), INSTRUCTION)
        .await
        .expect_err("run should fail");
    assert!(matches!(
        err,
        CorrectionError::ServiceFailure { position: 0, .. }
    ));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn empty_snapshot_makes_no_requests() {
    let provider = FailingProvider::new();
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));
    let results = pipeline.run(&[], INSTRUCTION).await.expect("run");
    assert!(results.is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn every_record_changed_keeps_count_and_order() {
    let records = sample_records();
    let provider = FixedProvider::new(Completion::stop("rewritten"));
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));

    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");

    assert_eq!(results.len(), records.len());
    for (position, (result, record)) in results.iter().zip(&records).enumerate() {
        assert_eq!(result.position, position);
        assert_eq!(result.role, record.role);
        assert_eq!(result.content, record.content);
        assert_eq!(result.amended_text, "rewritten");
    }
}

#[tokio::test]
async fn empty_answer_counts_as_a_change() {
    let provider = ScriptedProvider::answering(vec!["   "]);
    let pipeline = CorrectionPipeline::new(Arc::new(provider));
    let records = vec![Record::new(Role::User, "remove me")];
    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].amended_text, "");
}

#[tokio::test]
async fn configured_marker_replaces_default() {
    let config = CorrectionConfig {
        no_change_marker: "NO EDIT".to_string(),
        instruction: None,
    };
    let provider = ScriptedProvider::answering(vec!["no edit", "HECK NO BROTHER"]);
    let pipeline = CorrectionPipeline::from_config(&config, Arc::new(provider.clone()));
    assert_eq!(pipeline.marker(), "NO EDIT");

    let records = vec![Record::new(Role::User, "a"), Record::new(Role::User, "b")];
    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].position, 1);
    assert!(provider.prompts()[0].ends_with("respond only with \"NO EDIT\"."));
}

#[tokio::test]
async fn blank_marker_keeps_default_marker() {
    let config = CorrectionConfig {
        no_change_marker: "   ".to_string(),
        instruction: None,
    };
    let provider = ScriptedProvider::answering(vec!["Ship it to 12 Main Street"]);
    let pipeline = CorrectionPipeline::from_config(&config, Arc::new(provider.clone()))
        .with_marker("");
    assert_eq!(pipeline.marker(), "HECK NO BROTHER");

    let records = vec![Record::new(Role::User, "Ship it to 12 Mian Street")];
    let results = pipeline.run(&records, INSTRUCTION).await.expect("run");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].amended_text, "Ship it to 12 Main Street");
    assert!(provider.prompts()[0].ends_with("respond only with \"HECK NO BROTHER\"."));
}

/// Cancellation lands between records and discards gathered results.
#[tokio::test]
async fn cancellation_stops_before_next_record() {
    let token = CancellationToken::new();
    let provider = TripwireProvider::new(token.clone(), 2);
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));

    let err = pipeline
        .run_with_cancel(&sample_records(), INSTRUCTION, &token)
        .await
        .expect_err("run should be cancelled");

    assert!(matches!(err, CorrectionError::Cancelled { position: 2 }));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn pre_cancelled_run_makes_no_requests() {
    let token = CancellationToken::new();
    token.cancel();
    let provider = FixedProvider::new(Completion::stop("x"));
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));
    let err = pipeline
        .run_with_cancel(&sample_records(), INSTRUCTION, &token)
        .await
        .expect_err("run should be cancelled");
    assert!(matches!(err, CorrectionError::Cancelled { position: 0 }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn events_trace_the_run() {
    let sink = CollectingSink::new();
    let provider = ScriptedProvider::new(vec![
        Ok(Completion::stop("fixed")),
        Ok(Completion::stop("HECK NO BROTHER")),
        incomplete(FinishReason::ContentFilter, ""),
    ]);
    let pipeline =
        CorrectionPipeline::new(Arc::new(provider)).with_event_sink(Arc::new(sink.clone()));
    let records = vec![
        Record::new(Role::User, "a"),
        Record::new(Role::Assistant, "b"),
        Record::new(Role::Tool, "c"),
    ];

    pipeline.run(&records, INSTRUCTION).await.expect("run");

    assert_eq!(
        sink.payloads(),
        vec![
            RunEventPayload::RunStarted { total: 3 },
            RunEventPayload::RecordSubmitted {
                position: 0,
                role: Role::User
            },
            RunEventPayload::CorrectionProduced {
                result: CorrectionResult {
                    position: 0,
                    role: Role::User,
                    content: "a".to_string(),
                    amended_text: "fixed".to_string(),
                }
            },
            RunEventPayload::RecordSubmitted {
                position: 1,
                role: Role::Assistant
            },
            RunEventPayload::RecordSkipped {
                position: 1,
                reason: SkipReason::NoChange
            },
            RunEventPayload::RecordSubmitted {
                position: 2,
                role: Role::Tool
            },
            RunEventPayload::RecordSkipped {
                position: 2,
                reason: SkipReason::Incomplete(FinishReason::ContentFilter)
            },
            RunEventPayload::RunCompleted { corrections: 1 },
        ]
    );
    let events = sink.events();
    assert!(events.iter().all(|event| event.run_id == events[0].run_id));
}

#[tokio::test]
async fn failed_run_emits_failure_event_last() {
    let sink = CollectingSink::new();
    let pipeline = CorrectionPipeline::new(Arc::new(FailingProvider::new()))
        .with_event_sink(Arc::new(sink.clone()));
    pipeline
        .run(&sample_records(), INSTRUCTION)
        .await
        .expect_err("run should fail");
    let payloads = sink.payloads();
    assert!(matches!(
        payloads.last(),
        Some(RunEventPayload::RunFailed { position: 0, .. })
    ));
    assert!(
        !payloads
            .iter()
            .any(|payload| matches!(payload, RunEventPayload::RunCompleted { .. }))
    );
}

/// A spawned run works on its snapshot while the editor keeps changing.
#[tokio::test]
async fn spawned_run_corrects_snapshot_and_updates_editor() {
    let mut editor = Editor::with_records(sample_records());
    let provider = ScriptedProvider::new(vec![
        Ok(Completion::stop("Ship it to 12 Main Street")),
        Ok(Completion::stop("HECK NO BROTHER")),
        Ok(Completion::stop("HECK NO BROTHER")),
        Ok(Completion::stop("My number is 555-0100")),
    ]);
    let pipeline = CorrectionPipeline::new(Arc::new(provider));

    let snapshot = editor.begin_correction().expect("begin");
    let run = pipeline.spawn(snapshot, INSTRUCTION);
    editor.remove_at(0).expect("edit during run");
    let outcome = run.finish().await;
    editor.finish_correction(outcome).expect("finish");

    let positions: Vec<usize> = editor.summary().iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 3]);
    assert_eq!(editor.summary()[0].content, "Ship it to 12 Mian Street");
    assert_eq!(editor.store().len(), 3);
    assert_eq!(editor.notice(), None);
}

/// Cancelling while a request is in flight stops the run at the next record.
#[tokio::test]
async fn spawned_run_can_be_cancelled_through_its_handle() {
    let provider = GatedProvider::new();
    let pipeline = CorrectionPipeline::new(Arc::new(provider.clone()));
    let run = pipeline.spawn(sample_records(), INSTRUCTION);
    let token = run.cancellation_token();

    provider.entered().await;
    run.cancel();
    assert!(token.is_cancelled());
    provider.release();

    let err = run.finish().await.expect_err("run should be cancelled");
    assert!(matches!(err, CorrectionError::Cancelled { position: 1 }));
    assert_eq!(provider.calls(), 1);
}
