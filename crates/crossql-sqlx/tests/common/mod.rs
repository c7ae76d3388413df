#![allow(dead_code)]

use crossql_core::{
    normalize_table, ColumnPartial, ColumnType, DbConfig, IndexInput, TableInput, TableSchema,
};
use crossql_sqlx::Connection;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub async fn memory() -> Connection {
    init_tracing();
    Connection::connect(&DbConfig::sqlite_memory())
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory database: {e}"))
}

pub fn ty(token: &str) -> ColumnType {
    token
        .parse()
        .unwrap_or_else(|e| panic!("Failed to parse type {token}: {e}"))
}

/// `pokemon(id int pk autoincrement, name str not null, primary_type str indexed,
/// height float, stats dict, legendary bool)` with a unique
/// `(name, primary_type)` index.
pub fn pokemon() -> TableSchema {
    normalize_table(
        TableInput::new("pokemon")
            .column(
                "id",
                ColumnPartial::of(ty("int")).primary(true).autoincrement(true),
            )
            .column("name", ColumnPartial::of(ty("str")).nullable(false))
            .column("primary_type", ColumnPartial::of(ty("str")).index(true))
            .column("height", ty("float"))
            .column("stats", ty("dict"))
            .column("legendary", ty("bool"))
            .index(IndexInput::on(["name", "primary_type"]).unique(true)),
    )
    .unwrap_or_else(|e| panic!("Failed to normalize: {e}"))
}
