//! The synchronous wrapper, driven from plain `#[test]` functions.

mod common;

use std::collections::BTreeMap;

use common::{init_tracing, pokemon};
use crossql_core::introspect::comparable;
use crossql_core::{
    DbConfig, Dialect, DriverKind, Error, Insert, Introspect, Output, OutputFormat, Resolve,
    Select, SqlValue,
};
use crossql_sqlx::BlockingConnection;
use serde_json::json;

fn memory() -> BlockingConnection {
    init_tracing();
    BlockingConnection::connect(&DbConfig::sqlite_memory())
        .unwrap_or_else(|e| panic!("Failed to open in-memory database: {e}"))
}

#[test]
fn test_blocking_connection_is_tagged() {
    let conn = memory();
    assert_eq!(conn.dialect(), Dialect::Sqlite);
    assert_eq!(conn.driver(), DriverKind::SqlxBlocking);
    assert_eq!(conn.resolve().unwrap().driver, DriverKind::SqlxBlocking);
}

#[test]
fn test_blocking_round_trip() {
    let conn = memory();
    let table = pokemon();
    conn.create_table(&table, false).unwrap();

    assert_eq!(conn.table_names().unwrap(), vec![String::from("pokemon")]);
    assert_eq!(
        conn.introspect_table("pokemon").unwrap(),
        comparable(&table, Dialect::Sqlite).unwrap()
    );

    let row = BTreeMap::from([
        (String::from("id"), SqlValue::Int(150)),
        (String::from("name"), SqlValue::from("Mewtwo")),
        (String::from("stats"), SqlValue::Json(json!({"hp": 106}))),
        (String::from("legendary"), SqlValue::Bool(true)),
    ]);
    let written = conn
        .insert(&Insert::new("pokemon").context(&table).dict_row(row))
        .unwrap();
    assert_eq!(written, 1);

    let stats = conn
        .select(
            &Select::new("pokemon").column("stats"),
            Some(&table),
            OutputFormat::CellList,
        )
        .unwrap();
    assert_eq!(stats, Output::CellList(vec![SqlValue::Json(json!({"hp": 106}))]));
    conn.close();
}

#[test]
fn test_blocking_introspect_missing_table() {
    let conn = memory();
    let err = conn.introspect_table("nowhere").unwrap_err();
    assert!(matches!(err, Error::TableDoesNotExist { ref table, .. } if table == "nowhere"));
}
