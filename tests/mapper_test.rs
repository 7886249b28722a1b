// ABOUTME: Integration tests for the generic row mapper against a live SQLite database
// ABOUTME: Covers binding resolution, coercion, skip diagnostics and error classification

#![allow(missing_docs, clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use velo_rental::database::mapper::{
    ColumnBinding, FieldSetter, MapError, MapperOptions, RowMapper, SkipReason, SqlParam,
    TableRecord,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Gadget {
    id: i64,
    label: String,
    weight: f64,
    active: bool,
    made_on: DateTime<Utc>,
    retired_at: Option<DateTime<Utc>>,
    serial: Option<String>,
}

impl TableRecord for Gadget {
    const TABLE: &'static str = "gadgets";

    fn bindings() -> &'static [ColumnBinding<Self>] {
        static BINDINGS: &[ColumnBinding<Gadget>] = &[
            ColumnBinding {
                field: "Id",
                nullable: false,
                setter: FieldSetter::Integer(|g, v| g.id = v),
            },
            ColumnBinding {
                field: "Label",
                nullable: false,
                setter: FieldSetter::Text(|g, v| g.label = v),
            },
            ColumnBinding {
                field: "Weight",
                nullable: false,
                setter: FieldSetter::Float(|g, v| g.weight = v),
            },
            ColumnBinding {
                field: "Active",
                nullable: false,
                setter: FieldSetter::Bool(|g, v| g.active = v),
            },
            ColumnBinding {
                field: "MadeOn",
                nullable: false,
                setter: FieldSetter::Timestamp(|g, v| g.made_on = v),
            },
            ColumnBinding {
                field: "RetiredAt",
                nullable: true,
                setter: FieldSetter::Timestamp(|g, v| g.retired_at = Some(v)),
            },
            ColumnBinding {
                field: "Serial",
                nullable: true,
                setter: FieldSetter::Text(|g, v| g.serial = Some(v)),
            },
        ];
        BINDINGS
    }
}

async fn create_test_pool() -> SqlitePool {
    // One connection so every statement sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        r"
        CREATE TABLE gadgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            label TEXT NOT NULL,
            weight REAL NOT NULL,
            active BOOLEAN NOT NULL,
            made_on DATETIME NOT NULL,
            retired_at DATETIME,
            serial TEXT
        )
        ",
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

async fn insert_gadget(pool: &SqlitePool, label: &str, weight: f64, made_on: &str) {
    sqlx::query(
        "INSERT INTO gadgets (label, weight, active, made_on) VALUES ($1, $2, 1, $3)",
    )
    .bind(label)
    .bind(weight)
    .bind(made_on)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn maps_one_record_per_row_in_delivery_order() {
    let pool = create_test_pool().await;
    insert_gadget(&pool, "alpha", 1.5, "2024-01-01 08:00:00").await;
    insert_gadget(&pool, "beta", 2.5, "2024-02-01 08:00:00").await;
    insert_gadget(&pool, "gamma", 3.5, "2024-03-01 08:00:00").await;

    let mapper = RowMapper::new(pool);
    let gadgets: Vec<Gadget> = mapper
        .map_all("SELECT * FROM gadgets ORDER BY id", &[])
        .await
        .unwrap();

    assert_eq!(gadgets.len(), 3);
    assert_eq!(gadgets[0].label, "alpha");
    assert_eq!(gadgets[2].label, "gamma");
    assert!(gadgets[0].active);
    assert_eq!(
        gadgets[1].made_on,
        Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn zero_matching_rows_yield_an_empty_vector() {
    let pool = create_test_pool().await;
    let mapper = RowMapper::new(pool);
    let gadgets: Vec<Gadget> = mapper
        .map_all(
            "SELECT * FROM gadgets WHERE label = $1",
            &[SqlParam::from("missing")],
        )
        .await
        .unwrap();
    assert!(gadgets.is_empty());
}

#[tokio::test]
async fn parameters_bind_positionally() {
    let pool = create_test_pool().await;
    insert_gadget(&pool, "alpha", 1.5, "2024-01-01 08:00:00").await;
    insert_gadget(&pool, "beta", 2.5, "2024-02-01 08:00:00").await;

    let mapper = RowMapper::new(pool);
    let gadgets: Vec<Gadget> = mapper
        .map_all(
            "SELECT * FROM gadgets WHERE weight > $1 AND label = $2",
            &[SqlParam::Float(2.0), SqlParam::from("beta")],
        )
        .await
        .unwrap();
    assert_eq!(gadgets.len(), 1);
    assert_eq!(gadgets[0].label, "beta");
}

#[tokio::test]
async fn columns_without_bindings_are_ignored() {
    let pool = create_test_pool().await;
    insert_gadget(&pool, "alpha", 1.5, "2024-01-01 08:00:00").await;

    let mapper = RowMapper::new(pool);
    // Aliased columns that resolve to no binding must not disturb the ones
    // that do.
    let rows = mapper
        .map_rows::<Gadget>(
            "SELECT id, label, 99 AS mystery_extra, weight, active, made_on FROM gadgets",
            &[],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].record.label, "alpha");
    assert!(rows[0].skipped.is_empty());
}

#[tokio::test]
async fn malformed_text_cell_is_skipped_with_diagnostic() {
    let pool = create_test_pool().await;
    // SQLite's flexible typing happily stores text in a REAL column.
    sqlx::query(
        "INSERT INTO gadgets (label, weight, active, made_on) VALUES ('odd', 'abc', 1, '2024-01-01 08:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mapper = RowMapper::new(pool);
    let rows = mapper
        .map_rows::<Gadget>("SELECT * FROM gadgets", &[])
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert!((rows[0].record.weight - 0.0).abs() < f64::EPSILON);
    assert_eq!(rows[0].skipped.len(), 1);
    assert_eq!(rows[0].skipped[0].column, "weight");
    assert!(matches!(
        rows[0].skipped[0].reason,
        SkipReason::Parse { .. }
    ));
    // The rest of the row still mapped.
    assert_eq!(rows[0].record.label, "odd");
}

#[tokio::test]
async fn malformed_timestamp_is_skipped_with_diagnostic() {
    let pool = create_test_pool().await;
    insert_gadget(&pool, "alpha", 1.5, "January 1st, 2024").await;

    let mapper = RowMapper::new(pool);
    let rows = mapper
        .map_rows::<Gadget>("SELECT * FROM gadgets", &[])
        .await
        .unwrap();
    assert_eq!(rows[0].record.made_on, DateTime::<Utc>::default());
    assert_eq!(rows[0].skipped.len(), 1);
    assert_eq!(rows[0].skipped[0].column, "made_on");
}

#[tokio::test]
async fn bare_date_text_maps_to_midnight() {
    let pool = create_test_pool().await;
    insert_gadget(&pool, "alpha", 1.5, "2024-05-20").await;

    let mapper = RowMapper::new(pool);
    let gadgets: Vec<Gadget> = mapper.map_all("SELECT * FROM gadgets", &[]).await.unwrap();
    assert_eq!(
        gadgets[0].made_on,
        Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn null_handling_is_lenient_by_default_and_strict_on_request() {
    let pool = create_test_pool().await;
    sqlx::query(
        "INSERT INTO gadgets (label, weight, active, made_on, retired_at, serial)
         VALUES ('alpha', 1.5, 1, '2024-01-01 08:00:00', NULL, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mapper = RowMapper::new(pool.clone());
    // Optional fields absent, no diagnostics for them.
    let rows = mapper
        .map_rows::<Gadget>("SELECT * FROM gadgets", &[])
        .await
        .unwrap();
    assert_eq!(rows[0].record.retired_at, None);
    assert_eq!(rows[0].record.serial, None);
    assert!(rows[0].skipped.is_empty());

    // A null in a required column: default plus diagnostic in lenient mode.
    let rows = mapper
        .map_rows::<Gadget>("SELECT id, NULL AS label, weight, active, made_on FROM gadgets", &[])
        .await
        .unwrap();
    assert_eq!(rows[0].record.label, "");
    assert_eq!(rows[0].skipped[0].reason, SkipReason::NullForRequired);

    // Strict mode turns the same situation into an error.
    let strict = RowMapper::with_options(
        pool,
        MapperOptions {
            strict_nulls: true,
        },
    );
    let err = strict
        .map_rows::<Gadget>("SELECT id, NULL AS label, weight, active, made_on FROM gadgets", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MapError::NullForRequired { column } if column == "label"));
}

#[tokio::test]
async fn unpreparable_statement_reports_metadata_failure() {
    let pool = create_test_pool().await;
    let mapper = RowMapper::new(pool);
    let err = mapper
        .map_rows::<Gadget>("SELECT * FROM no_such_table", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MapError::Metadata(_)));
}

#[tokio::test]
async fn integer_valued_boolean_column_maps_to_bool() {
    let pool = create_test_pool().await;
    sqlx::query(
        "INSERT INTO gadgets (label, weight, active, made_on) VALUES ('off', 1.0, 0, '2024-01-01 08:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mapper = RowMapper::new(pool);
    let gadgets: Vec<Gadget> = mapper.map_all("SELECT * FROM gadgets", &[]).await.unwrap();
    assert!(!gadgets[0].active);
}
