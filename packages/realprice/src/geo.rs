//! Geo Filter - great-circle distance and the radius/category/age predicates.

use crate::records::{Category, CleanRecord, Coordinates, FilteredRecord};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Uses the haversine formula for accuracy on Earth's surface.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Outcome of a filter pass.
///
/// "No candidate carries coordinates" is reported separately from
/// "candidates had coordinates but none matched" so callers can tell a
/// coordinate-less dataset apart from an empty radius.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    /// Matching records, most recent transaction first.
    Matches(Vec<FilteredRecord>),
    /// No candidate record carried coordinates; distance is undefined.
    NoLocationData,
    /// Candidates carried coordinates but none passed the predicates.
    NoMatches,
}

impl FilterOutcome {
    /// The matched records, or an empty slice for the structural outcomes.
    pub fn records(&self) -> &[FilteredRecord] {
        match self {
            FilterOutcome::Matches(records) => records,
            _ => &[],
        }
    }
}

/// Filter records around `center`: distance within `radius_km`, then
/// category equality, then (for buildings with a cap) age.
///
/// Records without coordinates never appear in the output. Ties on the
/// transaction date keep no further defined order.
pub fn filter_records(
    records: &[CleanRecord],
    center: Coordinates,
    radius_km: f64,
    category: Category,
    max_age_years: Option<u32>,
) -> FilterOutcome {
    let mut located = 0usize;
    let mut matches: Vec<FilteredRecord> = Vec::new();

    for record in records {
        let Some(coordinates) = record.coordinates else {
            continue;
        };
        located += 1;

        let distance_km = haversine_km(center, coordinates);
        if distance_km > radius_km {
            continue;
        }
        if record.category != category {
            continue;
        }
        if category == Category::Building {
            if let Some(max_age) = max_age_years {
                if record.building_age_years > max_age {
                    continue;
                }
            }
        }

        matches.push(FilteredRecord {
            record: record.clone(),
            distance_km,
        });
    }

    if located == 0 {
        return FilterOutcome::NoLocationData;
    }
    if matches.is_empty() {
        return FilterOutcome::NoMatches;
    }

    matches.sort_by(|a, b| b.record.transaction_date.cmp(&a.record.transaction_date));
    FilterOutcome::Matches(matches)
}
