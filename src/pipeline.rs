//! One analysis run: sheet in, normalized records and per-record results out.

use crate::codec::{self, Sheet};
use crate::error::Result;
use crate::normalizer::{self, RowShape};
use crate::overview::{self, DatasetOverview};
use crate::record::CanonicalRecord;
use crate::stats::{self, AnalysisResult, AnalyzeOpts};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    #[serde(skip)]
    pub shape: RowShape,
    #[serde(skip)]
    pub records: Vec<CanonicalRecord>,
    pub overview: DatasetOverview,
    pub results: Vec<AnalysisResult>,
}

/// `shape: None` detects the row shape from the header.
pub fn run_sheet(sheet: &Sheet, shape: Option<RowShape>, opts: &AnalyzeOpts) -> Result<AnalysisRun> {
    let shape = shape.unwrap_or_else(|| RowShape::detect(sheet));
    let records = normalizer::normalize(sheet, shape)?;
    let results = stats::analyze_with_opts(&records, opts);
    let overview = overview::overview(&records);
    info!(?shape, records = records.len(), "analysis complete");
    Ok(AnalysisRun { shape, records, overview, results })
}

pub fn run_file(path: &Path, shape: Option<RowShape>, opts: &AnalyzeOpts) -> Result<AnalysisRun> {
    let sheet = codec::read_file(path)?;
    run_sheet(&sheet, shape, opts)
}
