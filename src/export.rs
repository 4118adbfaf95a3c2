use crate::codec::{Cell, Sheet};
use crate::record::HOURS;
use crate::stats::AnalysisResult;
use chrono::NaiveDate;
use once_cell::sync::Lazy;

const FIXED_COLUMNS: [&str; 11] = [
    "키워드",
    "광고영역",
    "광고주",
    "URL",
    "평균 순위",
    "최고 시간대",
    "최고 순위값",
    "최저 시간대",
    "최저 순위값",
    "분산",
    "노출 시간수",
];

/// Export header, in output order. Downstream sheets depend on this order.
pub static EXPORT_COLUMNS: Lazy<Vec<String>> = Lazy::new(|| {
    FIXED_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain((0..HOURS).map(|h| format!("{:02}시", h)))
        .collect()
});

/// Flattens results into a header row plus one row per result.
pub fn to_rows(results: &[AnalysisResult]) -> Sheet {
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(results.len() + 1);
    rows.push(EXPORT_COLUMNS.iter().map(Cell::text).collect());
    rows.extend(results.iter().map(result_row));
    Sheet::new(rows)
}

fn result_row(r: &AnalysisResult) -> Vec<Cell> {
    let mut row = vec![
        Cell::text(r.keyword.as_str()),
        Cell::text(r.ad_area.as_str()),
        Cell::text(r.advertiser.as_str()),
        Cell::text(r.url.as_str()),
        Cell::Number(r.average),
        Cell::text(r.peak_hour.as_str()),
        Cell::Number(r.peak_value),
        Cell::text(r.lowest_hour.as_str()),
        Cell::Number(r.lowest_value),
        Cell::Number(r.variance),
        Cell::Number(r.active_hours as f64),
    ];
    row.extend(r.hours.iter().map(|v| Cell::Number(*v)));
    row
}

/// Default download name, e.g. `분석결과_2024-05-01.xlsx`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("분석결과_{}.xlsx", date.format("%Y-%m-%d"))
}
