use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hour-of-day slots in a record.
pub const HOURS: usize = 24;

const HOUR_LABELS: [&str; HOURS] = [
    "00", "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11",
    "12", "13", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23",
];

/// Two-digit label for an hour index. Indices past 23 clamp to "23".
pub fn hour_label(hour: usize) -> &'static str {
    HOUR_LABELS[hour.min(HOURS - 1)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AdChannel {
    #[default]
    #[serde(rename = "PC")]
    Pc,
    Mobile,
}

impl AdChannel {
    /// Recognizes the channel spellings seen in rank exports. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.eq_ignore_ascii_case("pc") {
            Some(AdChannel::Pc)
        } else if s.eq_ignore_ascii_case("mobile") || s.eq_ignore_ascii_case("mo") || s == "모바일" {
            Some(AdChannel::Mobile)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdChannel::Pc => "PC",
            AdChannel::Mobile => "Mobile",
        }
    }
}

impl fmt::Display for AdChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One keyword/advertiser/channel row with its 24-hour rank series.
///
/// An hour value of 0 means the ad was not exposed in that hour; a positive
/// value is the observed rank (lower is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub keyword: String,
    pub ad_area: AdChannel,
    pub advertiser: String,
    pub url: String,
    /// Mean rank as reported by the export. Never recomputed.
    pub average: f64,
    pub hours: [f64; HOURS],
}

impl CanonicalRecord {
    pub fn new(keyword: impl Into<String>, ad_area: AdChannel, hours: [f64; HOURS]) -> Self {
        Self {
            keyword: keyword.into(),
            ad_area,
            advertiser: String::new(),
            url: String::new(),
            average: 0.0,
            hours,
        }
    }

    pub fn with_advertiser(mut self, advertiser: impl Into<String>) -> Self {
        self.advertiser = advertiser.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_average(mut self, average: f64) -> Self {
        self.average = average;
        self
    }

    /// (label, value) pairs in hour order.
    pub fn hourly(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.hours.iter().enumerate().map(|(i, v)| (hour_label(i), *v))
    }

    pub fn active_hours(&self) -> usize {
        self.hours.iter().filter(|v| **v > 0.0).count()
    }
}
