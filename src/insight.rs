//! Narrative insight over a whole dataset, produced by a text-generation service.
//!
//! The exchange is a single request: a fixed instruction template with the
//! serialized records substituted in, and a free-form reply that must contain
//! one JSON object with the five report keys.

use crate::config::InsightConfig;
use crate::error::{truncate_preview, RankError, Result, PREVIEW_LEN};
use crate::record::CanonicalRecord;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

/// Placeholder replaced by the pretty-printed record list.
pub const DATA_PLACEHOLDER: &str = "{DATA}";

pub const PROMPT_TEMPLATE: &str = r#"You are a hands-on search advertising consultant. Interpret the ad rank monitoring results below (rank per hour, channel, keyword and advertiser) and produce insights a practitioner can act on immediately.

## Background
- The data records, for a period of time, the hourly exposure rank of ads on specific keywords.
- A rank of 0 (or null / missing) means the ad was not exposed in that hour.
- Each record has 24 hourly ranks in "hours", index 0 being 00:00 and index 23 being 23:00. Lower is better.
- State what the problem or opportunity is and what to do now, rather than explaining at length why.

## Input data
{DATA}

## Analysis guide (do not describe formulas or logic in the output)
Compute and compare the following from the data to reach conclusions, but never write the calculation method (standard deviation, thresholds and so on) or concept explanations in the output.

- Overall health: average rank, top 1-3 share where possible, share of non-exposure (0), hourly volatility
- Channel asymmetry: keywords and advertisers with a large PC vs Mobile gap in average rank or non-exposure share
- Competitive intensity: hours where many advertisers worsen together (average rank drops, more zeros), keywords or channels with high volatility
- Advertiser profile: classify advertisers from their patterns (steady, efficient, neglected, aggressive, ...) and derive what it means for our strategy
- Opportunity hours (golden time): hours where overall competition loosens (ranks broadly worse or more zeros), proposed as windows to win top positions at minimum cost

* Make the most of the data structure (keyword, channel, hour, rank) to reason along the dimensions above.
* Where possible, name at least one or two concrete keywords, advertisers, hours or PC/MO channels in each insight, and include at least one number (average rank, gap, share of zeros).
* Keep each item to 1-5 sentences.

## Requested items (1-5 sentences each, no algorithm or logic explanation)
- overall_health: summary of overall rank and exposure health (top positions held or not, non-exposure risk, volatility)
- media_asymmetry: keyword and advertiser patterns with large PC/Mobile asymmetry and what they mean
- competitor_dynamics: high-intensity hours, keywords or channels (bidding wars, concentrated competition, sudden shifts) and how to respond
- golden_time: opportunity hours (weaker competition, rising non-exposure) and how to use them, from an attacking or defensive angle
- action_items: one or two things to review right away (for example separate bids or budgets per channel, a day-parting test on specific hours, closer monitoring of specific advertisers or keywords)

## Output format (output JSON only, no other text)
{
"overall_health": "...",
"media_asymmetry": "...",
"competitor_dynamics": "...",
"golden_time": "...",
"action_items": "..."
}"#;

// Greedy: first '{' through the last '}' in the whole response.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightReport {
    pub overall_health: String,
    pub media_asymmetry: String,
    pub competitor_dynamics: String,
    pub golden_time: String,
    pub action_items: String,
}

/// Report keys with their accepted camelCase spelling.
const REPORT_KEYS: [(&str, &str); 5] = [
    ("overall_health", "overallHealth"),
    ("media_asymmetry", "mediaAsymmetry"),
    ("competitor_dynamics", "competitorDynamics"),
    ("golden_time", "goldenTime"),
    ("action_items", "actionItems"),
];

impl InsightReport {
    /// (title, text) pairs in report order.
    pub fn sections(&self) -> [(&'static str, &str); 5] {
        [
            ("Overall health", self.overall_health.as_str()),
            ("Channel asymmetry", self.media_asymmetry.as_str()),
            ("Competitor dynamics", self.competitor_dynamics.as_str()),
            ("Golden time", self.golden_time.as_str()),
            ("Action items", self.action_items.as_str()),
        ]
    }

    fn from_object(obj: &Map<String, Value>, response: &str) -> Result<Self> {
        let field = |(snake, camel): (&str, &str)| -> Result<String> {
            let value = obj.get(snake).or_else(|| obj.get(camel)).ok_or_else(|| {
                RankError::unparsable(format!("missing required key '{}'", snake), response)
            })?;
            value.as_str().map(str::to_string).ok_or_else(|| {
                RankError::unparsable(format!("key '{}' is not a string", snake), response)
            })
        };
        Ok(InsightReport {
            overall_health: field(REPORT_KEYS[0])?,
            media_asymmetry: field(REPORT_KEYS[1])?,
            competitor_dynamics: field(REPORT_KEYS[2])?,
            golden_time: field(REPORT_KEYS[3])?,
            action_items: field(REPORT_KEYS[4])?,
        })
    }
}

/// Substitutes the pretty-printed records into [`PROMPT_TEMPLATE`].
pub fn build_prompt(records: &[CanonicalRecord]) -> Result<String> {
    let data = serde_json::to_string_pretty(records)?;
    Ok(PROMPT_TEMPLATE.replacen(DATA_PLACEHOLDER, &data, 1))
}

/// The span from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.find(text).map(|m| m.as_str())
}

/// Pulls the five-key report out of a raw model response.
pub fn parse_insight(response: &str) -> Result<InsightReport> {
    let candidate = extract_json_object(response)
        .ok_or_else(|| RankError::unparsable("no JSON object found in response", response))?;
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| RankError::unparsable(format!("invalid JSON: {}", e), response))?;
    let obj = value
        .as_object()
        .ok_or_else(|| RankError::unparsable("JSON payload is not an object", response))?;
    InsightReport::from_object(obj, response)
}

/// A text-generation service taking one prompt and returning the full reply text.
#[async_trait]
pub trait InsightBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Runs one synthesis round trip. Empty input fails before the backend is called.
pub async fn synthesize<B>(backend: &B, records: &[CanonicalRecord]) -> Result<InsightReport>
where
    B: InsightBackend + ?Sized,
{
    if records.is_empty() {
        return Err(RankError::EmptyDataset);
    }
    let prompt = build_prompt(records)?;
    info!(records = records.len(), prompt_bytes = prompt.len(), "requesting insight");
    let response = backend.complete(&prompt).await?;
    debug!(response_bytes = response.len(), "insight response received");
    parse_insight(&response).map_err(|e| {
        warn!(error = %e, "insight response could not be parsed");
        e
    })
}

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API client.
pub struct AnthropicBackend {
    config: InsightConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicBackend {
    pub fn new(config: InsightConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RankError::Configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.api_base)
    }
}

#[async_trait]
impl InsightBackend for AnthropicBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", self.config.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "messages API responded");
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read error body: {}", e));
            return Err(RankError::Service {
                status: Some(status.as_u16()),
                message: truncate_preview(&text, PREVIEW_LEN),
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| RankError::Service {
            status: Some(status.as_u16()),
            message: format!("unreadable response body: {}", e),
        })?;
        parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .ok_or_else(|| RankError::Service {
                status: Some(status.as_u16()),
                message: "response contained no text content".to_string(),
            })
    }
}

fn transport_error(e: reqwest::Error) -> RankError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    };
    RankError::Service { status: e.status().map(|s| s.as_u16()), message }
}
