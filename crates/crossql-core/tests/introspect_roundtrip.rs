//! Create -> introspect round trips against catalog rows as each database
//! reports them for the generated DDL.

mod common;

use common::{normalize, pokemon, ty};
use crossql_core::introspect::{comparable, postgres, sqlite};
use crossql_core::{
    ColumnPartial, ConstraintSchema, CreateIndexes, CreateTable, Dialect, TableInput, TableSchema,
};

/// `trainers(id int pk, email VARCHAR(40) unique, region str, badges int)`
/// with `UNIQUE (region, badges)`.
fn trainers() -> TableSchema {
    normalize(
        TableInput::new("trainers")
            .column("id", ColumnPartial::of(ty("int")).primary(true))
            .column("email", ColumnPartial::of(ty("VARCHAR(40)")).unique(true))
            .column("region", ty("str"))
            .column("badges", ty("int"))
            .constraint(ConstraintSchema::unique(["region", "badges"])),
    )
}

fn sqlite_column(cid: i64, name: &str, type_name: &str, notnull: bool, pk: i64) -> sqlite::ColumnRow {
    sqlite::ColumnRow {
        cid,
        name: name.to_string(),
        type_name: type_name.to_string(),
        notnull,
        default: None,
        pk,
    }
}

fn pg_column(name: &str, data_type: &str, nullable: bool, default: Option<&str>) -> postgres::ColumnRow {
    postgres::ColumnRow {
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: String::from(if nullable { "YES" } else { "NO" }),
        default: default.map(str::to_string),
        character_maximum_length: None,
    }
}

fn pg_index(name: &str, definition: &str) -> postgres::IndexRow {
    postgres::IndexRow {
        name: name.to_string(),
        definition: definition.to_string(),
    }
}

fn pg_constraint(name: &str, kind: &str, definition: &str) -> postgres::ConstraintRow {
    postgres::ConstraintRow {
        name: name.to_string(),
        kind: kind.to_string(),
        definition: definition.to_string(),
    }
}

#[test]
fn sqlite_pokemon_round_trip() {
    let schema = pokemon();
    let table_sql = CreateTable::new(&schema).build(Dialect::Sqlite).unwrap();
    let index_sql = CreateIndexes::new(&schema).build(Dialect::Sqlite).unwrap();
    assert_eq!(index_sql.len(), 2);

    let catalog = sqlite::Catalog {
        table_sql: Some(table_sql),
        columns: vec![
            sqlite_column(0, "id", "INTEGER", false, 1),
            sqlite_column(1, "name", "TEXT", true, 0),
            sqlite_column(2, "primary_type", "TEXT", false, 0),
            sqlite_column(3, "height", "REAL", false, 0),
            sqlite_column(4, "stats", "JSON", false, 0),
            sqlite_column(5, "legendary", "BOOLEAN", false, 0),
        ],
        indices: vec![
            sqlite::IndexRow {
                name: String::from("index__pokemon__primary_type"),
                unique: false,
                origin: String::from("c"),
                columns: vec![Some(String::from("primary_type"))],
                sql: Some(index_sql[0].clone()),
            },
            sqlite::IndexRow {
                name: String::from("index__pokemon__name__primary_type"),
                unique: true,
                origin: String::from("c"),
                columns: vec![None, None],
                sql: Some(index_sql[1].clone()),
            },
        ],
    };

    let read_back = sqlite::assemble("pokemon", catalog).unwrap();
    assert_eq!(read_back, comparable(&schema, Dialect::Sqlite).unwrap());
}

#[test]
fn postgres_pokemon_round_trip() {
    let schema = pokemon();
    let index_sql = CreateIndexes::new(&schema)
        .single_line()
        .build(Dialect::Postgres)
        .unwrap();
    assert_eq!(
        index_sql[1],
        "CREATE UNIQUE INDEX index__pokemon__name__primary_type ON pokemon (name, primary_type) \
         NULLS NOT DISTINCT"
    );

    let catalog = postgres::Catalog {
        columns: vec![
            pg_column("id", "bigint", false, Some("nextval('pokemon_id_seq'::regclass)")),
            pg_column("name", "text", false, None),
            pg_column("primary_type", "text", true, None),
            pg_column("height", "double precision", true, None),
            pg_column("stats", "jsonb", true, None),
            pg_column("legendary", "boolean", true, None),
        ],
        primary_key: vec![String::from("id")],
        constraints: vec![pg_constraint("pokemon_pkey", "p", "PRIMARY KEY (id)")],
        indices: vec![
            pg_index(
                "index__pokemon__name__primary_type",
                "CREATE UNIQUE INDEX index__pokemon__name__primary_type ON public.pokemon \
                 USING btree (name, primary_type) NULLS NOT DISTINCT",
            ),
            pg_index(
                "index__pokemon__primary_type",
                "CREATE INDEX index__pokemon__primary_type ON public.pokemon \
                 USING btree (primary_type)",
            ),
            pg_index(
                "pokemon_pkey",
                "CREATE UNIQUE INDEX pokemon_pkey ON public.pokemon USING btree (id)",
            ),
        ],
    };

    let read_back = postgres::assemble("pokemon", catalog).unwrap();
    assert_eq!(read_back, comparable(&schema, Dialect::Postgres).unwrap());
    assert!(read_back.column("id").unwrap().autoincrement);
}

#[test]
fn postgres_constraints_round_trip() {
    let schema = trainers();
    let ddl = CreateTable::new(&schema)
        .single_line()
        .build(Dialect::Postgres)
        .unwrap();
    assert_eq!(
        ddl,
        "CREATE TABLE trainers (id BIGINT PRIMARY KEY, email VARCHAR(40) UNIQUE, region TEXT, \
         badges BIGINT, UNIQUE (region, badges))"
    );

    let mut email = pg_column("email", "character varying", true, None);
    email.character_maximum_length = Some(40);
    let catalog = postgres::Catalog {
        columns: vec![
            pg_column("id", "bigint", false, None),
            email,
            pg_column("region", "text", true, None),
            pg_column("badges", "bigint", true, None),
        ],
        primary_key: vec![String::from("id")],
        constraints: vec![
            pg_constraint("trainers_email_key", "u", "UNIQUE (email)"),
            pg_constraint("trainers_pkey", "p", "PRIMARY KEY (id)"),
            pg_constraint("trainers_region_badges_key", "u", "UNIQUE (region, badges)"),
        ],
        indices: vec![
            pg_index(
                "trainers_email_key",
                "CREATE UNIQUE INDEX trainers_email_key ON public.trainers USING btree (email)",
            ),
            pg_index(
                "trainers_pkey",
                "CREATE UNIQUE INDEX trainers_pkey ON public.trainers USING btree (id)",
            ),
            pg_index(
                "trainers_region_badges_key",
                "CREATE UNIQUE INDEX trainers_region_badges_key ON public.trainers \
                 USING btree (region, badges)",
            ),
        ],
    };

    let read_back = postgres::assemble("trainers", catalog).unwrap();
    assert_eq!(read_back, comparable(&schema, Dialect::Postgres).unwrap());
}

#[test]
fn sqlite_constraints_round_trip() {
    let schema = trainers();
    let catalog = sqlite::Catalog {
        table_sql: Some(CreateTable::new(&schema).build(Dialect::Sqlite).unwrap()),
        columns: vec![
            sqlite_column(0, "id", "INTEGER", false, 1),
            sqlite_column(1, "email", "TEXT", false, 0),
            sqlite_column(2, "region", "TEXT", false, 0),
            sqlite_column(3, "badges", "INTEGER", false, 0),
        ],
        indices: vec![
            sqlite::IndexRow {
                name: String::from("sqlite_autoindex_trainers_1"),
                unique: true,
                origin: String::from("u"),
                columns: vec![Some(String::from("email"))],
                sql: None,
            },
            sqlite::IndexRow {
                name: String::from("sqlite_autoindex_trainers_2"),
                unique: true,
                origin: String::from("u"),
                columns: vec![Some(String::from("region")), Some(String::from("badges"))],
                sql: None,
            },
        ],
    };

    let read_back = sqlite::assemble("trainers", catalog).unwrap();
    assert_eq!(read_back, comparable(&schema, Dialect::Sqlite).unwrap());
    // VARCHAR has no SQLite counterpart and comes back as TEXT.
    assert_eq!(read_back.column("email").unwrap().column_type, ty("TEXT"));
}
