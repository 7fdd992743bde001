//! Integration tests for the retail cleaning pipeline.
//!
//! These tests run every entity end to end over the CSV fixtures, the way the
//! CLI loads them: every raw field is read as text.

use chrono::{NaiveDate, NaiveDateTime};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use retail_cleaning::entities::stores::STORE_TYPES;
use retail_cleaning::{
    CleanedBatch, CleaningConfig, CleaningError, CleaningManifest, CleaningPipeline,
    CleaningStage, Entity, HISTORICAL_MEAN_WEIGHT_KG, WeightImputation, frame_from_json,
    write_outputs,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn pipeline() -> CleaningPipeline {
    CleaningPipeline::builder().build().unwrap()
}

fn clean(entity: Entity, filename: &str) -> CleanedBatch {
    pipeline().run(entity, &load_csv(filename)).unwrap()
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn integers(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

fn decimals(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn days(df: &DataFrame, name: &str) -> Vec<Option<i32>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Int32)
        .unwrap()
        .as_materialized_series()
        .i32()
        .unwrap()
        .into_iter()
        .collect()
}

fn millis(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

fn day_number(y: i32, m: u32, d: u32) -> i32 {
    let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
    (date - NaiveDate::default()).num_days() as i32
}

fn timestamp_ms(s: &str) -> i64 {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn csv_bytes(batch: &CleanedBatch) -> Vec<u8> {
    let mut df = batch.data.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .expect("Failed to write CSV");
    buf
}

fn assert_balanced(manifest: &CleaningManifest) {
    assert_eq!(
        manifest.rows_in,
        manifest.rows_out + manifest.rows_rejected(),
        "every input row must be either kept or counted as rejected"
    );
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Stores
// ============================================================================

#[test]
fn test_stores_end_to_end() {
    let batch = clean(Entity::Stores, "stores.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 7);
    assert_eq!(m.rows_rejected_by_category, 2);
    assert_eq!(m.rows_dropped_sentinel, 1);
    // "abc" is not in the repair table and still has letters.
    assert_eq!(m.rows_failed_coercion, 1);
    assert_eq!(m.rows_out, 3);
    assert_balanced(m);

    assert_eq!(m.columns_dropped, vec!["lat".to_string()]);
    assert!(batch.data.column("lat").is_err());
    assert!(batch.data.column("index").is_err());

    assert_eq!(
        strings(&batch.data, "store_code"),
        vec![
            Some("HI-9B97EE4E".to_string()),
            Some("LA-0772C7B9".to_string()),
            Some("PO-1A9B2D47".to_string()),
        ]
    );
    assert_eq!(integers(&batch.data, "staff_numbers"), vec![Some(34), Some(78), Some(30)]);
    assert_eq!(
        strings(&batch.data, "continent"),
        vec![
            Some("Europe".to_string()),
            Some("America".to_string()),
            Some("Europe".to_string()),
        ]
    );
    assert_eq!(m.values_corrected, 2);

    assert_eq!(
        days(&batch.data, "opening_date"),
        vec![Some(day_number(1996, 10, 25)), Some(day_number(2012, 10, 8)), None]
    );
    assert_eq!(m.missing_by_column.get("opening_date"), Some(&1));
    assert_eq!(m.missing_by_column.get("longitude"), Some(&1));
    assert_eq!(m.missing_by_column.get("latitude"), Some(&1));
    assert_eq!(m.values_coerced_to_missing, 3);
}

#[test]
fn test_stores_only_allowed_store_types_survive() {
    let batch = clean(Entity::Stores, "stores.csv");

    for store_type in strings(&batch.data, "store_type") {
        let store_type = store_type.expect("store_type is never missing");
        assert!(
            STORE_TYPES.contains(&store_type.as_str()),
            "unexpected store type {store_type}"
        );
    }
}

#[test]
fn test_stores_output_column_order() {
    let batch = clean(Entity::Stores, "stores.csv");
    let names: Vec<String> = batch
        .data
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    assert_eq!(
        names,
        vec![
            "address",
            "longitude",
            "locality",
            "store_code",
            "staff_numbers",
            "opening_date",
            "store_type",
            "latitude",
            "country_code",
            "continent",
        ]
    );
}

// ============================================================================
// Products
// ============================================================================

#[test]
fn test_products_end_to_end() {
    let batch = clean(Entity::Products, "products.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 6);
    assert_eq!(m.rows_rejected_by_category, 1);
    assert_eq!(m.rows_out, 5);
    assert_balanced(m);

    // The misspelled availability flag is corrected before validation.
    assert_eq!(m.values_corrected, 1);
    assert_eq!(
        strings(&batch.data, "removed")[0],
        Some("Still_available".to_string())
    );

    assert_eq!(
        strings(&batch.data, "product_code"),
        vec![
            Some("R7-3126933H".to_string()),
            Some("C2-7287916L".to_string()),
            Some("T4-1234567A".to_string()),
            Some("M9-7654321B".to_string()),
            Some("P3-1928374C".to_string()),
        ]
    );

    let prices = decimals(&batch.data, "product_price_sterling");
    assert_eq!(prices[3], None);
    assert_close(prices[0].unwrap(), 39.99);
    assert_close(prices[4].unwrap(), 24.5);
    assert_eq!(m.missing_by_column.get("product_price_sterling"), Some(&1));

    assert_eq!(
        days(&batch.data, "date_added")[4],
        Some(day_number(2008, 10, 12))
    );
}

#[test]
fn test_products_weights_normalized_and_imputed_with_batch_mean() {
    let batch = clean(Entity::Products, "products.csv");
    let m = &batch.manifest;

    let weights = decimals(&batch.data, "weight_kg");
    assert!(weights.iter().all(Option::is_some));

    let expected_mean = (1.6 + 0.59 + 1.0 + 2.8) / 4.0;
    assert_close(weights[0].unwrap(), 1.6);
    assert_close(weights[1].unwrap(), 0.59);
    assert_close(weights[2].unwrap(), expected_mean);

    assert_eq!(m.missing_by_column.get("weight_kg"), Some(&1));
    assert_eq!(m.values_imputed, 1);
    assert_close(m.imputed_value.unwrap(), expected_mean);
}

#[test]
fn test_products_fixed_weight_imputation() {
    let config = CleaningConfig::builder()
        .weight_imputation(WeightImputation::Fixed(HISTORICAL_MEAN_WEIGHT_KG))
        .build()
        .unwrap();
    let batch = CleaningPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(Entity::Products, &load_csv("products.csv"))
        .unwrap();

    assert_close(decimals(&batch.data, "weight_kg")[2].unwrap(), 3.15);
    assert_eq!(batch.manifest.imputed_value, Some(3.15));
}

#[test]
fn test_products_leave_weights_missing() {
    let config = CleaningConfig::builder()
        .weight_imputation(WeightImputation::Leave)
        .build()
        .unwrap();
    let batch = CleaningPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run(Entity::Products, &load_csv("products.csv"))
        .unwrap();

    assert_eq!(decimals(&batch.data, "weight_kg")[2], None);
    assert_eq!(batch.manifest.values_imputed, 0);
}

// ============================================================================
// Cards
// ============================================================================

#[test]
fn test_cards_end_to_end() {
    let batch = clean(Entity::Cards, "cards.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 6);
    assert_eq!(m.rows_rejected_by_category, 2);
    assert_eq!(m.rows_failed_coercion, 1);
    assert_eq!(m.rows_out, 3);
    assert_balanced(m);

    assert_eq!(
        integers(&batch.data, "card_number"),
        vec![
            Some(123_456_789_012),
            Some(30_060_773_296_197),
            Some(180_018_030_511_162),
        ]
    );
    assert_eq!(
        days(&batch.data, "date_payment_confirmed"),
        vec![
            Some(day_number(2015, 11, 25)),
            Some(day_number(2015, 11, 25)),
            None,
        ]
    );
    assert_eq!(m.missing_by_column.get("date_payment_confirmed"), Some(&1));
}

// ============================================================================
// Users
// ============================================================================

#[test]
fn test_users_end_to_end() {
    let batch = clean(Entity::Users, "users.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 5);
    assert_eq!(m.rows_rejected_by_category, 1);
    assert_eq!(m.rows_dropped_null, 1);
    assert_eq!(m.rows_out, 3);
    assert_balanced(m);

    assert!(m.columns_dropped.contains(&"country_copy".to_string()));
    assert_eq!(
        strings(&batch.data, "country_code"),
        vec![
            Some("DE".to_string()),
            Some("GB".to_string()),
            Some("US".to_string()),
        ]
    );
    assert_eq!(
        days(&batch.data, "date_of_birth")[2],
        Some(day_number(1943, 3, 8))
    );
    assert_eq!(days(&batch.data, "join_date")[2], None);
    assert_eq!(m.missing_by_column.get("join_date"), Some(&1));
}

// ============================================================================
// Orders
// ============================================================================

#[test]
fn test_orders_end_to_end() {
    let batch = clean(Entity::Orders, "orders.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 3);
    assert_eq!(m.rows_failed_coercion, 1);
    assert_eq!(m.rows_out, 2);
    assert_balanced(m);

    assert_eq!(
        m.columns_dropped,
        vec!["first_name".to_string(), "last_name".to_string(), "1".to_string()]
    );
    assert_eq!(batch.data.width(), 6);
    assert_eq!(
        strings(&batch.data, "product_code"),
        vec![Some("R7-3126933H".to_string()), Some("C2-7287916L".to_string())]
    );
    assert_eq!(integers(&batch.data, "product_quantity"), vec![Some(3), Some(4)]);
}

#[test]
fn test_orders_cleaning_is_deterministic() {
    let raw = load_csv("orders.csv");
    let pipeline = pipeline();

    let first = pipeline.run(Entity::Orders, &raw).unwrap();
    let second = pipeline.run(Entity::Orders, &raw).unwrap();

    assert!(first.data.equals_missing(&second.data));
    assert_eq!(first.manifest.actions, second.manifest.actions);
    assert_eq!(csv_bytes(&first), csv_bytes(&second));
}

// ============================================================================
// Date Events
// ============================================================================

#[test]
fn test_date_events_end_to_end() {
    let batch = clean(Entity::DateEvents, "date_events.csv");
    let m = &batch.manifest;

    assert_eq!(m.rows_in, 5);
    assert_eq!(m.rows_rejected_by_category, 1);
    // Month 13 is out of range.
    assert_eq!(m.rows_failed_coercion, 1);
    assert_eq!(m.rows_out, 3);
    assert_balanced(m);

    assert_eq!(
        days(&batch.data, "purchase_date"),
        vec![Some(day_number(2021, 4, 15)), None, Some(day_number(1999, 7, 3))]
    );
    assert_eq!(
        millis(&batch.data, "purchase_datetime"),
        vec![
            Some(timestamp_ms("2021-04-15 13:20:05")),
            None,
            Some(timestamp_ms("1999-07-03 10:10:10")),
        ]
    );
    assert_eq!(integers(&batch.data, "month"), vec![Some(4), Some(4), Some(7)]);
    assert_eq!(m.missing_by_column.get("purchase_date"), Some(&1));
    assert_eq!(m.missing_by_column.get("purchase_datetime"), Some(&1));
}

#[test]
fn test_date_events_from_column_oriented_json() {
    let content = std::fs::read_to_string(fixtures_path().join("date_events.json")).unwrap();
    let document: serde_json::Value = serde_json::from_str(&content).unwrap();
    let raw = frame_from_json(&document).unwrap();

    let batch = pipeline().run(Entity::DateEvents, &raw).unwrap();

    assert_eq!(batch.manifest.rows_out, 4);
    // Row keys are ordered numerically, so "10" comes last.
    assert_eq!(
        days(&batch.data, "purchase_date"),
        vec![
            Some(day_number(2012, 9, 19)),
            Some(day_number(2021, 4, 15)),
            Some(day_number(2019, 6, 2)),
            Some(day_number(2008, 12, 24)),
        ]
    );
}

// ============================================================================
// Error Handling
// ============================================================================

#[test]
fn test_missing_required_column_is_batch_malformed() {
    let raw = load_csv("stores.csv").drop("store_type").unwrap();
    let err = pipeline().run(Entity::Stores, &raw).unwrap_err();

    assert!(err.is_batch_malformed());
    assert_eq!(err.error_code(), "BATCH_MALFORMED");
    assert!(err.to_string().contains("store_type"));
}

#[test]
fn test_wrong_entity_for_batch_is_batch_malformed() {
    let err = pipeline()
        .run(Entity::Products, &load_csv("cards.csv"))
        .unwrap_err();
    assert!(err.is_batch_malformed());
}

#[test]
fn test_unsupported_json_shape() {
    let err = frame_from_json(&serde_json::json!("not a table")).unwrap_err();
    assert!(matches!(err, CleaningError::UnsupportedInput(_)));
}

#[test]
fn test_raw_batch_is_not_modified() {
    let raw = load_csv("products.csv");
    let before = raw.clone();

    pipeline().run(Entity::Products, &raw).unwrap();

    assert!(raw.equals_missing(&before));
}

// ============================================================================
// Orchestration
// ============================================================================

#[test]
fn test_run_many_cleans_all_entities() {
    let batches = vec![
        (Entity::Users, load_csv("users.csv")),
        (Entity::Cards, load_csv("cards.csv")),
        (Entity::Stores, load_csv("stores.csv")),
        (Entity::Products, load_csv("products.csv")),
        (Entity::Orders, load_csv("orders.csv")),
        (Entity::DateEvents, load_csv("date_events.csv")),
    ];

    let results = pipeline().run_many(&batches);
    assert_eq!(results.len(), 6);

    for ((entity, _), result) in batches.iter().zip(&results) {
        let batch = result.as_ref().unwrap();
        assert_eq!(batch.manifest.entity, *entity);
        assert_balanced(&batch.manifest);
    }

    // Parallel runs agree with sequential ones.
    let sequential = clean(Entity::Stores, "stores.csv");
    assert!(results[2].as_ref().unwrap().data.equals_missing(&sequential.data));
}

#[test]
fn test_progress_updates_per_entity() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);

    let pipeline = CleaningPipeline::builder()
        .on_progress(move |update| sink.lock().unwrap().push((update.entity, update.stage)))
        .build()
        .unwrap();

    pipeline.run_many(&[
        (Entity::Cards, load_csv("cards.csv")),
        (Entity::Orders, load_csv("orders.csv")),
    ]);

    let updates = updates.lock().unwrap();
    for entity in [Entity::Cards, Entity::Orders] {
        let stages: Vec<CleaningStage> = updates
            .iter()
            .filter(|(e, _)| *e == entity)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(stages.first(), Some(&CleaningStage::Validating));
        assert_eq!(stages.last(), Some(&CleaningStage::Complete));
    }
}

#[test]
fn test_write_outputs_round_trip() {
    let dir = std::env::temp_dir().join(format!("retail-cleaning-it-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let batch = clean(Entity::Orders, "orders.csv");
    let paths = write_outputs(&batch, &dir).unwrap();

    let written = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(paths.data.clone()))
        .unwrap()
        .finish()
        .unwrap();
    assert_eq!(written.shape(), (2, 6));

    let manifest: CleaningManifest =
        serde_json::from_str(&std::fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest.rows_out, 2);
    assert_eq!(manifest.entity, Entity::Orders);

    std::fs::remove_dir_all(&dir).unwrap();
}
