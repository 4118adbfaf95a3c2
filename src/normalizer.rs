//! Converts raw sheet rows into [`CanonicalRecord`]s.
//!
//! Two row shapes exist in rank exports:
//! - named: the header row carries localized labels and every data row is read
//!   through the label table below;
//! - positional: the header row is discarded and cells are read by fixed offset
//!   (keyword, channel, advertiser, url, average, then 24 hour columns).

use crate::codec::{Cell, Sheet};
use crate::error::{RankError, Result};
use crate::record::{AdChannel, CanonicalRecord, HOURS};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// A data row keyed by its header label.
pub type NamedRow = BTreeMap<String, Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Keyword,
    AdArea,
    Advertiser,
    Url,
    Average,
    Hour(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    Named,
    Positional,
}

const FIXED_LABELS: &[(&str, Field)] = &[
    ("키워드", Field::Keyword),
    ("keyword", Field::Keyword),
    ("광고영역", Field::AdArea),
    ("매체", Field::AdArea),
    ("ad_area", Field::AdArea),
    ("adchannel", Field::AdArea),
    ("ad_channel", Field::AdArea),
    ("channel", Field::AdArea),
    ("device", Field::AdArea),
    ("광고주", Field::Advertiser),
    ("advertiser", Field::Advertiser),
    ("url", Field::Url),
    ("평균", Field::Average),
    ("평균 순위", Field::Average),
    ("average", Field::Average),
];

static LABEL_TABLE: Lazy<HashMap<String, Field>> = Lazy::new(|| {
    let mut table: HashMap<String, Field> = FIXED_LABELS
        .iter()
        .map(|(label, field)| (label.to_string(), *field))
        .collect();
    for h in 0..HOURS {
        table.insert(format!("{:02}시", h), Field::Hour(h));
        table.insert(format!("{}시", h), Field::Hour(h));
        table.insert(format!("hour_{:02}", h), Field::Hour(h));
        table.insert(format!("{:02}", h), Field::Hour(h));
    }
    table
});

/// Looks a header label up in the label table. Surrounding whitespace and
/// ASCII case are ignored.
pub fn resolve_label(label: &str) -> Option<Field> {
    LABEL_TABLE.get(&label.trim().to_lowercase()).copied()
}

impl RowShape {
    /// Named when any header label resolves to the keyword column, positional
    /// otherwise. Other labels are not checked here; an unknown label in a
    /// named header fails later with [`RankError::UnknownColumn`].
    pub fn detect(sheet: &Sheet) -> RowShape {
        let Some(header) = sheet.header() else {
            return RowShape::Positional;
        };
        let has_keyword = header
            .iter()
            .filter(|c| !c.is_empty())
            .any(|c| resolve_label(&c.to_string()) == Some(Field::Keyword));
        if has_keyword { RowShape::Named } else { RowShape::Positional }
    }
}

pub fn normalize(sheet: &Sheet, shape: RowShape) -> Result<Vec<CanonicalRecord>> {
    let records = match shape {
        RowShape::Named => normalize_named(&named_rows(sheet))?,
        RowShape::Positional => normalize_positional(sheet)?,
    };
    info!(?shape, records = records.len(), "normalized sheet");
    Ok(records)
}

/// Pairs every data row with the header labels. Blank rows and
/// unlabeled columns are dropped.
pub fn named_rows(sheet: &Sheet) -> Vec<NamedRow> {
    let Some(header) = sheet.header() else {
        return Vec::new();
    };
    let labels: Vec<Option<String>> = header
        .iter()
        .map(|c| if c.is_empty() { None } else { Some(c.to_string().trim().to_string()) })
        .collect();
    sheet
        .data_rows()
        .iter()
        .filter(|row| !is_blank(row))
        .map(|row| {
            labels
                .iter()
                .zip(row.iter())
                .filter_map(|(label, cell)| label.as_ref().map(|l| (l.clone(), cell.clone())))
                .collect::<NamedRow>()
        })
        .collect()
}

pub fn normalize_named(rows: &[NamedRow]) -> Result<Vec<CanonicalRecord>> {
    rows.iter().map(named_record).collect()
}

fn named_record(row: &NamedRow) -> Result<CanonicalRecord> {
    let mut rec = CanonicalRecord::new(String::new(), AdChannel::default(), [0.0; HOURS]);
    for (label, cell) in row {
        let field = resolve_label(label).ok_or_else(|| RankError::UnknownColumn { label: label.clone() })?;
        apply(&mut rec, field, cell);
    }
    Ok(rec)
}

pub fn normalize_positional(sheet: &Sheet) -> Result<Vec<CanonicalRecord>> {
    if sheet.len() < 2 {
        return Err(RankError::InsufficientData { rows: sheet.len() });
    }
    let records: Vec<CanonicalRecord> = sheet
        .data_rows()
        .iter()
        .filter(|row| !is_blank(row))
        .map(|row| positional_record(row))
        .collect();
    if records.is_empty() {
        return Err(RankError::InsufficientData { rows: sheet.len() });
    }
    debug!(data_rows = sheet.len() - 1, records = records.len(), "positional rows read");
    Ok(records)
}

const POSITIONAL_FIELDS: [Field; 5] = [
    Field::Keyword,
    Field::AdArea,
    Field::Advertiser,
    Field::Url,
    Field::Average,
];

fn positional_record(row: &[Cell]) -> CanonicalRecord {
    let mut rec = CanonicalRecord::new(String::new(), AdChannel::default(), [0.0; HOURS]);
    let fields = POSITIONAL_FIELDS
        .iter()
        .copied()
        .chain((0..HOURS).map(Field::Hour));
    for (field, cell) in fields.zip(row.iter()) {
        apply(&mut rec, field, cell);
    }
    rec
}

fn apply(rec: &mut CanonicalRecord, field: Field, cell: &Cell) {
    match field {
        Field::Keyword => rec.keyword = text_value(cell),
        Field::AdArea => rec.ad_area = AdChannel::parse(&cell.to_string()).unwrap_or_default(),
        Field::Advertiser => rec.advertiser = text_value(cell),
        Field::Url => rec.url = text_value(cell),
        Field::Average => rec.average = numeric_value(cell),
        Field::Hour(h) => rec.hours[h] = numeric_value(cell),
    }
}

fn text_value(cell: &Cell) -> String {
    cell.to_string().trim().to_string()
}

// Unparsable, non-finite and negative values all read as 0.
fn numeric_value(cell: &Cell) -> f64 {
    match cell.as_number() {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

fn is_blank(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}
