#![allow(dead_code)]

use crossql_core::{
    normalize_table, ColumnPartial, ColumnType, IndexInput, TableInput, TableSchema,
};

pub fn ty(token: &str) -> ColumnType {
    token
        .parse()
        .unwrap_or_else(|e| panic!("Failed to parse type {token}: {e}"))
}

pub fn normalize(input: TableInput) -> TableSchema {
    normalize_table(input).unwrap_or_else(|e| panic!("Failed to normalize: {e}"))
}

pub fn normalize_json(json: &str) -> TableSchema {
    let input: TableInput =
        serde_json::from_str(json).unwrap_or_else(|e| panic!("Bad table JSON: {json}\n{e}"));
    normalize(input)
}

/// `pokemon(id int pk autoincrement, name str not null, primary_type str indexed,
/// height float, stats dict, legendary bool)` with a unique
/// `(name, primary_type)` index.
pub fn pokemon() -> TableSchema {
    normalize(
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
}
