use crate::record::{AdChannel, CanonicalRecord, HOURS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which hours take part in peak selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakPolicy {
    /// All 24 hours, zeros included. An all-zero row peaks at "00" with 0.
    #[default]
    AllHours,
    /// Only hours with a positive rank. Falls back to "00"/0 when none exist.
    ActiveOnly,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOpts {
    pub peak_policy: PeakPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub keyword: String,
    pub ad_area: AdChannel,
    pub advertiser: String,
    pub url: String,
    pub average: f64,
    pub peak_hour: String,
    pub peak_value: f64,
    pub lowest_hour: String,
    pub lowest_value: f64,
    pub variance: f64,
    pub active_hours: usize,
    pub hours: [f64; HOURS],
}

pub fn analyze(records: &[CanonicalRecord]) -> Vec<AnalysisResult> {
    analyze_with_opts(records, &AnalyzeOpts::default())
}

pub fn analyze_with_opts(records: &[CanonicalRecord], opts: &AnalyzeOpts) -> Vec<AnalysisResult> {
    let out: Vec<AnalysisResult> = records.iter().map(|r| analyze_record(r, opts)).collect();
    debug!(records = out.len(), policy = ?opts.peak_policy, "analyzed records");
    out
}

pub fn analyze_record(record: &CanonicalRecord, opts: &AnalyzeOpts) -> AnalysisResult {
    let active: Vec<(&'static str, f64)> = record.hourly().filter(|(_, v)| *v > 0.0).collect();

    let (peak_hour, peak_value) = match opts.peak_policy {
        PeakPolicy::AllHours => max_first(record.hourly()),
        PeakPolicy::ActiveOnly => max_first(active.iter().copied()),
    };
    let (lowest_hour, lowest_value) = min_first(active.iter().copied());
    let values: Vec<f64> = active.iter().map(|(_, v)| *v).collect();

    AnalysisResult {
        keyword: record.keyword.clone(),
        ad_area: record.ad_area,
        advertiser: record.advertiser.clone(),
        url: record.url.clone(),
        average: record.average,
        peak_hour: peak_hour.to_string(),
        peak_value,
        lowest_hour: lowest_hour.to_string(),
        lowest_value,
        variance: round2(population_variance(&values)),
        active_hours: values.len(),
        hours: record.hours,
    }
}

const SENTINEL: (&str, f64) = ("00", 0.0);

// Strict comparisons keep the earliest hour on ties.
fn max_first(mut it: impl Iterator<Item = (&'static str, f64)>) -> (&'static str, f64) {
    let Some(first) = it.next() else { return SENTINEL };
    it.fold(first, |best, cur| if cur.1 > best.1 { cur } else { best })
}

fn min_first(mut it: impl Iterator<Item = (&'static str, f64)>) -> (&'static str, f64) {
    let Some(first) = it.next() else { return SENTINEL };
    it.fold(first, |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Variance dividing by the count. An empty slice yields 0.
///
/// Values are summed in sorted order so the result depends only on the
/// multiset of values, bit for bit.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Rounds to two decimals, halves away from zero. Non-finite input becomes 0.
/// Values too large to scale have no fractional digits and pass through.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    let scaled = x * 100.0;
    if !scaled.is_finite() {
        return x;
    }
    scaled.round() / 100.0
}
