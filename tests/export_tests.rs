use chrono::NaiveDate;
use rankscope::codec::Cell;
use rankscope::export::{self, EXPORT_COLUMNS};
use rankscope::record::{AdChannel, CanonicalRecord};
use rankscope::stats;

#[test]
fn column_layout_is_fixed() {
    assert_eq!(EXPORT_COLUMNS.len(), 35);
    assert_eq!(
        &EXPORT_COLUMNS[..11],
        &["키워드", "광고영역", "광고주", "URL", "평균 순위", "최고 시간대", "최고 순위값", "최저 시간대", "최저 순위값", "분산", "노출 시간수"]
    );
    assert_eq!(EXPORT_COLUMNS[11], "00시");
    assert_eq!(EXPORT_COLUMNS[34], "23시");
}

#[test]
fn rows_project_results_in_column_order() {
    let mut hours = [0.0; 24];
    hours[2] = 5.0;
    hours[3] = 5.0;
    hours[4] = 3.0;
    let rec = CanonicalRecord::new("shoes", AdChannel::Mobile, hours)
        .with_advertiser("acme")
        .with_url("https://acme.example")
        .with_average(3.2);
    let results = stats::analyze(&[rec]);
    let sheet = export::to_rows(&results);

    assert_eq!(sheet.len(), 2);
    let header = sheet.header().unwrap();
    assert_eq!(header.len(), EXPORT_COLUMNS.len());
    let row = &sheet.rows[1];
    assert_eq!(row.len(), EXPORT_COLUMNS.len());
    assert_eq!(row[0], Cell::text("shoes"));
    assert_eq!(row[1], Cell::text("Mobile"));
    assert_eq!(row[2], Cell::text("acme"));
    assert_eq!(row[3], Cell::text("https://acme.example"));
    assert_eq!(row[4], Cell::Number(3.2));
    assert_eq!(row[5], Cell::text("02"));
    assert_eq!(row[6], Cell::Number(5.0));
    assert_eq!(row[7], Cell::text("04"));
    assert_eq!(row[8], Cell::Number(3.0));
    assert_eq!(row[9], Cell::Number(0.89));
    assert_eq!(row[10], Cell::Number(3.0));
    assert_eq!(row[11 + 2], Cell::Number(5.0));
    assert_eq!(row[11 + 23], Cell::Number(0.0));
}

#[test]
fn empty_results_still_carry_the_header() {
    let sheet = export::to_rows(&[]);
    assert_eq!(sheet.len(), 1);
}

#[test]
fn file_name_carries_the_date() {
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    assert_eq!(export::export_file_name(date), "분석결과_2024-05-01.xlsx");
}
