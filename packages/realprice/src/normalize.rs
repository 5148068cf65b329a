//! Field Normalizer - derives canonical fields from raw heterogeneous rows.
//!
//! All "maybe missing" column handling lives here; downstream stages only
//! ever see fully-formed [`CleanRecord`]s. The stage is pure: identical
//! input yields identical output, and the only notion of "now" is the
//! `current_year` supplied by the caller.

use chrono::NaiveDate;
use tracing::debug;

use crate::records::{Category, CleanRecord, Coordinates, RawRecord};

/// Square meters per ping.
const SQM_PER_PING: f64 = 3.3058;

/// Offset between the ROC calendar year and the Gregorian year.
const ROC_YEAR_OFFSET: i32 = 1911;

/// Source column: transaction date in ROC encoding.
const COL_TRANSACTION_DATE: &str = "交易年月日";
/// Source column: unit price in NT$ per square meter.
const COL_UNIT_PRICE_SQM: &str = "單價元平方公尺";
/// Source column: transaction subject free text.
const COL_SUBJECT: &str = "交易標的";
/// Source column: construction completion year-month in ROC encoding.
const COL_CONSTRUCTION_YM: &str = "建築完成年月";

/// Alternate column names, in lookup order.
const ADDRESS_COLUMNS: &[&str] = &["土地位置建物門牌", "location", "地址"];
const TOTAL_PRICE_COLUMNS: &[&str] = &["總價元", "總價", "price"];
const LATITUDE_COLUMNS: &[&str] = &["緯度", "latitude", "Latitude", "LAT", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["經度", "longitude", "Longitude", "LON", "lon", "lng"];

/// Result of normalizing a merged table.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub records: Vec<CleanRecord>,
    /// Rows excluded for an unparseable date or unit price.
    pub rows_dropped: usize,
}

/// Decode a ROC-calendar date string such as `1120520` (2023-05-20).
///
/// The leading three digits are the ROC year, the next two the month and
/// the remaining one or two the day; total length must be 6 or 7 ASCII
/// digits. Anything else, including out-of-range month or day, decodes to
/// `None`.
pub fn parse_roc_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if !(s.len() == 6 || s.len() == 7) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let roc_year: i32 = s[..3].parse().ok()?;
    let month: u32 = s[3..5].parse().ok()?;
    let day: u32 = s[5..].parse().ok()?;
    NaiveDate::from_ymd_opt(roc_year + ROC_YEAR_OFFSET, month, day)
}

/// Convert NT$ per square meter to ten-thousand NT$ per ping.
pub fn unit_price_per_ping(price_per_sqm: f64) -> f64 {
    price_per_sqm * SQM_PER_PING / 10_000.0
}

/// Derive the transaction category from the subject text.
///
/// Substring match, first match wins: housing or structure markers mean a
/// building, otherwise a land marker means land.
pub fn categorize_subject(subject: &str) -> Category {
    if subject.contains('房') || subject.contains("建物") {
        Category::Building
    } else if subject.contains("土地") {
        Category::Land
    } else {
        Category::Other
    }
}

/// Compute a building age from a ROC year-month value such as `0890615` or
/// `11205`; the leading three digits are the ROC year.
///
/// Missing, short or non-numeric values yield 0, as do completion years in
/// the future.
pub fn building_age(value: Option<&str>, current_year: i32) -> u32 {
    let Some(s) = value.map(str::trim) else {
        return 0;
    };
    if s.len() < 3 || !s.as_bytes()[..3].iter().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    let Ok(roc_year) = s[..3].parse::<i32>() else {
        return 0;
    };
    (current_year - (roc_year + ROC_YEAR_OFFSET)).max(0) as u32
}

/// Parse a nonnegative finite decimal; anything else is "no value".
fn parse_price(value: &str) -> Option<f64> {
    let parsed: f64 = value.trim().parse().ok()?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

/// First value among the alternate column names present in the row.
fn first_present<'a>(row: &'a RawRecord, columns: &[&str]) -> Option<&'a str> {
    columns.iter().find_map(|c| row.get(*c)).map(String::as_str)
}

fn normalize_row(row: &RawRecord, current_year: i32) -> Option<CleanRecord> {
    let transaction_date = row.get(COL_TRANSACTION_DATE).and_then(|v| parse_roc_date(v))?;
    let unit_price = row
        .get(COL_UNIT_PRICE_SQM)
        .and_then(|v| parse_price(v))
        .map(unit_price_per_ping)?;

    let category = row
        .get(COL_SUBJECT)
        .map(|s| categorize_subject(s))
        .unwrap_or(Category::Other);

    let building_age_years = match category {
        Category::Land => 0,
        _ => building_age(
            row.get(COL_CONSTRUCTION_YM).map(String::as_str),
            current_year,
        ),
    };

    let address = first_present(row, ADDRESS_COLUMNS).unwrap_or("").to_string();
    let total_price = first_present(row, TOTAL_PRICE_COLUMNS).and_then(parse_price);

    let coordinates = match (
        first_present(row, LATITUDE_COLUMNS).and_then(|v| v.trim().parse::<f64>().ok()),
        first_present(row, LONGITUDE_COLUMNS).and_then(|v| v.trim().parse::<f64>().ok()),
    ) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    };

    Some(CleanRecord {
        transaction_date,
        unit_price_per_ping: unit_price,
        total_price,
        category,
        building_age_years,
        address,
        coordinates,
    })
}

/// Normalize a merged table into clean records, dropping rows that fail
/// required-field normalization.
pub fn normalize_rows(rows: &[RawRecord], current_year: i32) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for row in rows {
        match normalize_row(row, current_year) {
            Some(record) => report.records.push(record),
            None => report.rows_dropped += 1,
        }
    }
    debug!(
        clean = report.records.len(),
        dropped = report.rows_dropped,
        "Normalization finished"
    );
    report
}
