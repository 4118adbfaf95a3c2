use async_trait::async_trait;
use rankscope::insight::{self, InsightBackend, PROMPT_TEMPLATE};
use rankscope::record::{AdChannel, CanonicalRecord};
use rankscope::RankError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const REPORT_JSON: &str = r#"{
  "overall_health": "Top-3 held on 'shoes' for most of the day.",
  "media_asymmetry": "Mobile trails PC by 2.1 ranks on 'boots'.",
  "competitor_dynamics": "Ranks worsen together between 19 and 21.",
  "golden_time": "03-05 shows 60% non-exposure; bid up there.",
  "action_items": "Split PC/Mobile budgets and test day-parting at 03-05."
}"#;

/// Returns a canned reply and records every prompt it receives.
struct StubBackend {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubBackend {
    fn replying(text: &str) -> Self {
        Self { reply: Ok(text.to_string()), calls: AtomicUsize::new(0), last_prompt: Mutex::new(None) }
    }

    fn failing(status: u16) -> Self {
        Self { reply: Err(status), calls: AtomicUsize::new(0), last_prompt: Mutex::new(None) }
    }
}

#[async_trait]
impl InsightBackend for StubBackend {
    async fn complete(&self, prompt: &str) -> rankscope::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(RankError::Service { status: Some(*status), message: "overloaded".into() }),
        }
    }
}

fn records() -> Vec<CanonicalRecord> {
    let mut hours = [0.0; 24];
    hours[2] = 5.0;
    hours[3] = 5.0;
    hours[4] = 3.0;
    vec![
        CanonicalRecord::new("shoes", AdChannel::Mobile, hours).with_advertiser("acme").with_average(3.2),
        CanonicalRecord::new("boots", AdChannel::Pc, [1.0; 24]).with_advertiser("globex"),
    ]
}

#[test]
fn prompt_embeds_the_serialized_dataset() {
    let recs = records();
    let prompt = insight::build_prompt(&recs).unwrap();
    assert!(!prompt.contains(insight::DATA_PLACEHOLDER));
    assert!(prompt.contains(&serde_json::to_string_pretty(&recs).unwrap()));
    assert!(prompt.contains("\"keyword\": \"shoes\""));
    assert!(prompt.contains("\"ad_area\": \"Mobile\""));
    for key in ["overall_health", "media_asymmetry", "competitor_dynamics", "golden_time", "action_items"] {
        assert!(PROMPT_TEMPLATE.contains(key), "template lacks {key}");
    }
    // deterministic
    assert_eq!(prompt, insight::build_prompt(&recs).unwrap());
}

#[test]
fn parses_fenced_response_with_prose() {
    let response = format!("Here is the result:\n```json\n{}\n```", REPORT_JSON);
    let report = insight::parse_insight(&response).unwrap();
    assert!(report.overall_health.contains("shoes"));
    assert!(report.golden_time.starts_with("03-05"));
    assert_eq!(report.sections()[4].1, report.action_items);
}

#[test]
fn accepts_camel_case_keys() {
    let response = r#"{"overallHealth":"a","mediaAsymmetry":"b","competitorDynamics":"c","goldenTime":"d","actionItems":"e"}"#;
    let report = insight::parse_insight(response).unwrap();
    assert_eq!(report.overall_health, "a");
    assert_eq!(report.action_items, "e");
}

#[test]
fn response_without_braces_is_unparsable() {
    let err = insight::parse_insight("I could not analyze this data.").unwrap_err();
    match err {
        RankError::UnparsableInsight { preview, .. } => assert!(preview.contains("could not analyze")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_json_and_missing_keys_are_unparsable() {
    let err = insight::parse_insight("{ overall_health: nope }").unwrap_err();
    assert!(matches!(err, RankError::UnparsableInsight { .. }));

    let partial = r#"{"overall_health":"a","media_asymmetry":"b","competitor_dynamics":"c","golden_time":"d"}"#;
    match insight::parse_insight(partial).unwrap_err() {
        RankError::UnparsableInsight { reason, .. } => assert!(reason.contains("action_items")),
        other => panic!("unexpected error: {other:?}"),
    }

    let wrong_type = r#"{"overall_health":1,"media_asymmetry":"b","competitor_dynamics":"c","golden_time":"d","action_items":"e"}"#;
    assert!(matches!(insight::parse_insight(wrong_type).unwrap_err(), RankError::UnparsableInsight { .. }));
}

#[test]
fn preview_is_truncated() {
    let noise = "x".repeat(1000);
    match insight::parse_insight(&noise).unwrap_err() {
        RankError::UnparsableInsight { preview, .. } => {
            assert!(preview.len() < 300);
            assert!(preview.ends_with("..."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn synthesize_makes_one_call() {
    let backend = StubBackend::replying(&format!("Sure!\n{}", REPORT_JSON));
    let report = insight::synthesize(&backend, &records()).await.unwrap();
    assert!(report.media_asymmetry.contains("boots"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("globex"));
}

#[tokio::test]
async fn empty_dataset_fails_before_calling() {
    let backend = StubBackend::replying(REPORT_JSON);
    let err = insight::synthesize(&backend, &[]).await.unwrap_err();
    assert!(matches!(err, RankError::EmptyDataset));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn service_errors_pass_through() {
    let backend = StubBackend::failing(529);
    let err = insight::synthesize(&backend, &records()).await.unwrap_err();
    assert!(matches!(err, RankError::Service { status: Some(529), .. }));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unparsable_reply_is_not_patched_up() {
    let backend = StubBackend::replying("```json\n{\"overall_health\": \"only one\"}\n```");
    let err = insight::synthesize(&backend, &records()).await.unwrap_err();
    assert!(matches!(err, RankError::UnparsableInsight { .. }));
}
