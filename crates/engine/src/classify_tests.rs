// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use scanctl_adapters::llm::ReportTypeMatch;
use scanctl_adapters::FakeLlmClassifier;

fn llm_dyn(fake: FakeLlmClassifier) -> Arc<dyn LlmClassifier> {
    Arc::new(fake)
}

const FI_TEXT: &str = "The applicant is requested to submit an acoustic assessment report \
    in accordance with BS 4142.";

#[tokio::test]
async fn filename_reject_short_circuits_before_any_llm_call() {
    let fake = FakeLlmClassifier::new();
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "decision notice.pdf",
            text: FI_TEXT,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::FilenameReject
        }
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn length_reject_over_page_cap() {
    let fake = FakeLlmClassifier::new();
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();
    let long_text = "a".repeat(2500 * 101);

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "request.pdf",
            text: &long_text,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::LengthReject
        }
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn structure_reject_on_report_markers() {
    let fake = FakeLlmClassifier::new();
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();
    let text = "Table of Contents\n1. Introduction\nThis report has been prepared by Acme Ltd.";

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "request.pdf",
            text,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::StructureReject
        }
    );
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn cheap_prefilter_rejects_when_unlikely() {
    let fake = FakeLlmClassifier::new();
    fake.set_cheap_filter_default(false);
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "letter.pdf",
            text: "Dear Sir, thank you for your submission.",
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::CheapPreFilter
        }
    );
    assert_eq!(fake.calls().len(), 1);
}

#[tokio::test]
async fn fi_detection_rejects_non_fi_documents() {
    let fake = FakeLlmClassifier::new();
    fake.set_cheap_filter_default(true);
    fake.set_is_fi_default(false);
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "objection.pdf",
            text: "We object to this planning application on the following grounds.",
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::FiDetection
        }
    );
}

#[tokio::test]
async fn full_cascade_confirms_match_with_valid_quote() {
    let fake = FakeLlmClassifier::new();
    fake.set_report_type_match(
        "acoustic",
        ReportTypeMatch {
            matches: true,
            validation_quote: "submit an acoustic assessment report".to_string(),
            confidence: 0.9,
        },
    );
    let llm = llm_dyn(fake);
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "request.pdf",
            text: FI_TEXT,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    match decision {
        Decision::Match {
            validation_quote,
            confidence,
        } => {
            assert!(validation_quote.contains("acoustic"));
            assert_eq!(confidence, 0.9);
        }
        other => panic!("expected match, got {other:?}"),
    }
}

#[tokio::test]
async fn hallucinated_quote_is_dropped_by_post_validation() {
    let fake = FakeLlmClassifier::new();
    fake.set_report_type_match(
        "acoustic",
        ReportTypeMatch {
            matches: true,
            validation_quote: "submit a lovely little letter".to_string(),
            confidence: 0.9,
        },
    );
    let llm = llm_dyn(fake);
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "request.pdf",
            text: FI_TEXT,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::HallucinatedQuote
        }
    );
}

#[tokio::test]
async fn no_type_match_is_distinct_from_hallucinated_quote() {
    let fake = FakeLlmClassifier::new();
    fake.set_report_type_match(
        "acoustic",
        ReportTypeMatch {
            matches: false,
            validation_quote: String::new(),
            confidence: 0.1,
        },
    );
    let llm = llm_dyn(fake);
    let cache = ClassifierCache::new();

    let decision = classify_document(
        &llm,
        &cache,
        ClassifyInput {
            file_name: "request.pdf",
            text: FI_TEXT,
            target_type: ReportType::Acoustic,
            project_id: "proj-1",
        },
    )
    .await
    .unwrap();

    assert_eq!(
        decision,
        Decision::Rejected {
            stage: Stage::ReportTypeMatch
        }
    );
}

#[tokio::test]
async fn cache_hit_short_circuits_llm_calls() {
    let fake = FakeLlmClassifier::new();
    fake.set_report_type_match(
        "acoustic",
        ReportTypeMatch {
            matches: true,
            validation_quote: "submit an acoustic assessment report".to_string(),
            confidence: 0.9,
        },
    );
    let llm = llm_dyn(fake.clone());
    let cache = ClassifierCache::new();

    let input = || ClassifyInput {
        file_name: "request.pdf",
        text: FI_TEXT,
        target_type: ReportType::Acoustic,
        project_id: "proj-1",
    };

    let first = classify_document(&llm, &cache, input()).await.unwrap();
    let calls_after_first = fake.calls().len();
    let second = classify_document(&llm, &cache, input()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fake.calls().len(), calls_after_first);
}

#[test]
fn cache_key_differs_by_project_and_type() {
    let a = cache_key("same text", ReportType::Acoustic, "proj-1");
    let b = cache_key("same text", ReportType::Acoustic, "proj-2");
    let c = cache_key("same text", ReportType::Transport, "proj-1");
    assert_ne!(a, b);
    assert_ne!(a, c);
}
