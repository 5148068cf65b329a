//! Integration tests for the full pipeline, driven by the mock store and
//! geocoder.

use std::time::Duration;

use realprice::{
    Category, Coordinates, MockDocumentStore, MockGeocoder, Pipeline, PipelineError,
    QueryOutcome, QueryParams,
};

const CENTER_ADDRESS: &str = "台中市大里區西湖路427號";

fn center() -> Coordinates {
    Coordinates::new(24.0, 120.0)
}

/// Transactions spread around the center: one building at ~1.4 km, one at
/// ~1.6 km, one land parcel on the center, plus a row with a broken date.
const DOC_NEAR: &str = "\
The villages and towns urban district,transaction sign,serial number,unit price,total price,completion,address,latitude,longitude\n\
鄉鎮市區,交易標的,交易年月日,單價元平方公尺,總價元,建築完成年月,土地位置建物門牌,lat,lon\n\
大里區,房地(土地+建物),1120520,100000,8500000,0890615,台中市大里區西湖路400號,24.0126,120.0\n\
大里區,房地(土地+建物),1120601,120000,9100000,1100101,台中市大里區東湖路1號,24.0144,120.0\n\
大里區,土地,1120415,50000,3000000,,台中市大里區中興路二段,24.0,120.0\n\
大里區,房地(土地+建物),broken,100000,8500000,0890615,台中市大里區西湖路402號,24.0126,120.0\n";

/// An older building transaction inside the radius, in a subfolder.
const DOC_OLD: &str = "\
meta,meta,meta,meta,meta,meta,meta\n\
交易標的,交易年月日,單價元平方公尺,建築完成年月,土地位置建物門牌,lat,lon\n\
房地(土地+建物),1100310,90000,0700101,台中市大里區西湖路390號,24.0063,120.0\n";

/// Rows that never carry coordinates.
const DOC_UNLOCATED: &str = "\
meta,meta,meta\n\
交易標的,交易年月日,單價元平方公尺\n\
房地(土地+建物),1120520,100000\n";

fn seeded_store() -> MockDocumentStore {
    let store = MockDocumentStore::new();
    store.add_document("root", "near", "a_lvr_land_a.csv", DOC_NEAR);
    store.add_folder("root", "archive", "2021");
    store.add_document("archive", "old", "b_lvr_land_a.csv", DOC_OLD);
    store
}

fn seeded_geocoder() -> MockGeocoder {
    MockGeocoder::new().with_answer(CENTER_ADDRESS, center())
}

fn params(category: Category, max_age_years: Option<u32>) -> QueryParams {
    QueryParams {
        address: CENTER_ADDRESS.to_string(),
        radius_km: 1.5,
        category,
        max_age_years,
        current_year: 2023,
    }
}

#[tokio::test]
async fn finds_buildings_in_radius_sorted_by_date() {
    let pipeline = Pipeline::new(seeded_store(), seeded_geocoder(), "root");

    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert_eq!(result.center, center());
    let QueryOutcome::Matches(records) = result.outcome else {
        panic!("expected matches");
    };

    // the 1.6 km record is out of range; the land parcel is the wrong
    // category; the broken-date row was dropped
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.distance_km <= 1.5));
    assert!(records[0].record.transaction_date > records[1].record.transaction_date);
    assert_eq!(records[0].record.address, "台中市大里區西湖路400號");

    assert_eq!(result.report.documents_found, 2);
    assert_eq!(result.report.rows_merged, 5);
    assert_eq!(result.report.rows_dropped, 1);
}

#[tokio::test]
async fn age_cap_filters_old_buildings() {
    let pipeline = Pipeline::new(seeded_store(), seeded_geocoder(), "root");

    let result = pipeline
        .run(&params(Category::Building, Some(30)))
        .await
        .unwrap();

    let QueryOutcome::Matches(records) = result.outcome else {
        panic!("expected matches");
    };
    // the 1981-vintage building (age 42) is filtered out
    assert_eq!(records.len(), 1);
    assert!(records.iter().all(|r| r.record.building_age_years <= 30));
}

#[tokio::test]
async fn land_queries_ignore_the_age_cap() {
    let pipeline = Pipeline::new(seeded_store(), seeded_geocoder(), "root");

    let result = pipeline
        .run(&params(Category::Land, Some(0)))
        .await
        .unwrap();

    let QueryOutcome::Matches(records) = result.outcome else {
        panic!("expected matches");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record.category, Category::Land);
    assert_eq!(records[0].record.building_age_years, 0);
}

#[tokio::test]
async fn partial_source_failures_degrade_instead_of_aborting() {
    let store = seeded_store();
    store.add_folder("root", "broken-folder", "2022");
    store.fail_folder("broken-folder");
    store.add_document("root", "corrupt", "c_lvr_land_a.csv", "ignored");
    store.fail_document("corrupt");

    let pipeline = Pipeline::new(store, seeded_geocoder(), "root");
    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert!(matches!(result.outcome, QueryOutcome::Matches(_)));
    assert_eq!(result.report.documents_found, 3);
    assert_eq!(result.report.documents_failed, 1);
    assert_eq!(result.report.folders_failed, 1);
}

#[tokio::test]
async fn unresolvable_address_stops_before_fetching_data() {
    let store = seeded_store();
    let pipeline = Pipeline::new(store.clone(), MockGeocoder::new(), "root")
        .with_fallback_pause(Duration::ZERO);

    let err = pipeline
        .run(&params(Category::Building, None))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::UnresolvableAddress { address } if address == CENTER_ADDRESS
    ));
    assert_eq!(store.list_call_count(), 0);
}

#[tokio::test]
async fn fallback_resolution_reaches_the_data() {
    let geocoder = MockGeocoder::new().with_answer("台中市大里區西湖路", center());
    let pipeline = Pipeline::new(seeded_store(), geocoder.clone(), "root")
        .with_fallback_pause(Duration::ZERO);

    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert!(matches!(result.outcome, QueryOutcome::Matches(_)));
    assert_eq!(geocoder.call_count(), 2);
}

#[tokio::test]
async fn empty_tree_reports_no_data() {
    let pipeline = Pipeline::new(MockDocumentStore::new(), seeded_geocoder(), "root");

    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert!(matches!(result.outcome, QueryOutcome::NoData));
    assert_eq!(result.report.documents_found, 0);
}

#[tokio::test]
async fn coordinate_less_data_reports_no_location_data() {
    let store = MockDocumentStore::new();
    store.add_document("root", "flat", "flat.csv", DOC_UNLOCATED);

    let pipeline = Pipeline::new(store, seeded_geocoder(), "root");
    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert!(matches!(result.outcome, QueryOutcome::NoLocationData));
    assert_eq!(result.report.rows_unlocated, 1);
}

#[tokio::test]
async fn out_of_radius_data_reports_no_matches() {
    let store = seeded_store();
    let geocoder = MockGeocoder::new().with_answer(CENTER_ADDRESS, Coordinates::new(25.0, 121.5));

    let pipeline = Pipeline::new(store, geocoder, "root");
    let result = pipeline.run(&params(Category::Building, None)).await.unwrap();

    assert!(matches!(result.outcome, QueryOutcome::NoMatches));
}

#[tokio::test]
async fn rejects_a_non_positive_radius() {
    let pipeline = Pipeline::new(seeded_store(), seeded_geocoder(), "root");

    let mut query = params(Category::Building, None);
    query.radius_km = 0.0;

    let err = pipeline.run(&query).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidQuery { .. }));
}

#[tokio::test]
async fn second_query_reuses_the_cached_table() {
    let store = seeded_store();
    let pipeline = Pipeline::new(store.clone(), seeded_geocoder(), "root");

    pipeline.run(&params(Category::Building, None)).await.unwrap();
    let listings_after_first = store.list_call_count();

    pipeline.run(&params(Category::Land, None)).await.unwrap();
    assert_eq!(store.list_call_count(), listings_after_first);
}
