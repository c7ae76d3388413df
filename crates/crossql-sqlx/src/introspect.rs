//! Live introspection: runs the catalog queries of `crossql-core` and hands
//! the rows to its assembly.

use crossql_core::introspect::{list_tables_query, postgres, sqlite};
use crossql_core::{validate_identifier, Result, TableSchema};
use sqlx::postgres::PgPool;
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use crate::connection::{Connection, Pool};

impl Connection {
    /// Lists the user tables of the database, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns the translated driver error.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        let sql = list_tables_query(self.dialect());
        let names = match &self.pool {
            Pool::Sqlite(pool) => sqlx::query_scalar::<_, String>(sql).fetch_all(pool).await,
            Pool::Postgres(pool) => sqlx::query_scalar::<_, String>(sql).fetch_all(pool).await,
        };
        names.map_err(|e| self.capture(e))
    }

    /// Reads the schema of `table` back from the database.
    ///
    /// # Errors
    ///
    /// Returns [`crossql_core::Error::TableDoesNotExist`] for a missing
    /// table, [`crossql_core::Error::InvalidIdentifier`] for an unsafe name
    /// and the translated driver error when a catalog query fails.
    pub async fn introspect_table(&self, table: &str) -> Result<TableSchema> {
        validate_identifier(table)?;
        debug!(table, dialect = %self.dialect(), "Introspecting table");
        match &self.pool {
            Pool::Sqlite(pool) => {
                let catalog = sqlite_catalog(pool, table)
                    .await
                    .map_err(|e| self.capture(e))?;
                sqlite::assemble(table, catalog)
            }
            Pool::Postgres(pool) => {
                let catalog = postgres_catalog(pool, table)
                    .await
                    .map_err(|e| self.capture(e))?;
                postgres::assemble(table, catalog)
            }
        }
    }
}

async fn sqlite_catalog(
    pool: &SqlitePool,
    table: &str,
) -> std::result::Result<sqlite::Catalog, sqlx::Error> {
    let columns: Vec<sqlite::ColumnRow> =
        sqlx::query_as::<_, (i64, String, String, i64, Option<String>, i64)>(sqlite::TABLE_INFO)
            .bind(table)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|(cid, name, type_name, notnull, default, pk)| sqlite::ColumnRow {
                cid,
                name,
                type_name,
                notnull: notnull != 0,
                default,
                pk,
            })
            .collect();
    if columns.is_empty() {
        return Ok(sqlite::Catalog::default());
    }

    let table_sql = sqlx::query_scalar::<_, Option<String>>(sqlite::TABLE_SQL)
        .bind(table)
        .fetch_optional(pool)
        .await?
        .flatten();

    let listed = sqlx::query_as::<_, (String, i64, String)>(sqlite::INDEX_LIST)
        .bind(table)
        .fetch_all(pool)
        .await?;
    let mut indices = Vec::with_capacity(listed.len());
    for (name, unique, origin) in listed {
        let columns = sqlx::query_as::<_, (i64, Option<String>)>(sqlite::INDEX_INFO)
            .bind(&name)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(|(_, column)| column)
            .collect();
        let sql = sqlx::query_scalar::<_, Option<String>>(sqlite::INDEX_SQL)
            .bind(&name)
            .fetch_optional(pool)
            .await?
            .flatten();
        indices.push(sqlite::IndexRow {
            name,
            unique: unique != 0,
            origin,
            columns,
            sql,
        });
    }

    Ok(sqlite::Catalog {
        table_sql,
        columns,
        indices,
    })
}

/// Catalog queries take the table name as their only parameter.
fn numbered(sql: &str) -> String {
    sql.replace("%s", "$1")
}

async fn postgres_catalog(
    pool: &PgPool,
    table: &str,
) -> std::result::Result<postgres::Catalog, sqlx::Error> {
    let columns: Vec<postgres::ColumnRow> = sqlx::query_as::<
        _,
        (String, String, String, Option<String>, Option<i32>),
    >(&numbered(postgres::COLUMNS))
    .bind(table)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(
        |(name, data_type, is_nullable, default, character_maximum_length)| postgres::ColumnRow {
            name,
            data_type,
            is_nullable,
            default,
            character_maximum_length,
        },
    )
    .collect();
    // The regclass casts below fail for a missing table.
    if columns.is_empty() {
        return Ok(postgres::Catalog::default());
    }

    let primary_key = sqlx::query_scalar::<_, String>(&numbered(postgres::PRIMARY_KEY))
        .bind(table)
        .fetch_all(pool)
        .await?;

    let constraints = sqlx::query_as::<_, (String, String, String)>(&numbered(postgres::CONSTRAINTS))
        .bind(table)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(name, kind, definition)| postgres::ConstraintRow {
            name,
            kind,
            definition,
        })
        .collect();

    let indices = sqlx::query_as::<_, (String, String)>(&numbered(postgres::INDEXES))
        .bind(table)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(name, definition)| postgres::IndexRow { name, definition })
        .collect();

    Ok(postgres::Catalog {
        columns,
        primary_key,
        constraints,
        indices,
    })
}
