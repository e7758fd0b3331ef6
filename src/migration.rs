//! Apply the table registry to the database: schema, tables, indexes.
//! Every statement is idempotent so this runs on each start.

use crate::config::{validate, TableDef, TableRegistry};
use crate::error::AppError;
use crate::store::quote_ident as quote;
use sqlx::PgPool;

/// CREATE statements for one table, in execution order.
pub fn table_ddl(schema: &str, table: &TableDef) -> Vec<String> {
    let full_name = format!("{}.{}", quote(schema), quote(table.name));

    let mut col_defs = vec![
        format!("{} BIGSERIAL PRIMARY KEY", quote("id")),
        format!("{} TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()", quote("created_at")),
        format!("{} TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()", quote("updated_at")),
    ];
    for c in &table.columns {
        let mut def = format!("{} {}", quote(c.name), c.sql_type.pg_name().to_uppercase());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        col_defs.push(def);
    }

    let mut stmts = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        full_name,
        col_defs.join(",\n  ")
    )];

    stmts.push(format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({} DESC, {})",
        quote(&format!("{}_created_idx", table.name)),
        full_name,
        quote("created_at"),
        quote("id")
    ));
    if let Some(key) = table.group_key {
        stmts.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({}, {} DESC, {} DESC)",
            quote(&format!("{}_{}_latest_idx", table.name, key)),
            full_name,
            quote(key),
            quote("created_at"),
            quote("id")
        ));
    }
    for col in &table.unique {
        stmts.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({})",
            quote(&format!("{}_{}_key", table.name, col)),
            full_name,
            quote(col)
        ));
    }
    stmts
}

/// Validate the registry, then create schema, tables and indexes that do not exist yet.
pub async fn apply_migrations(pool: &PgPool, registry: &TableRegistry) -> Result<(), AppError> {
    validate(registry)?;

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote(registry.schema())))
        .execute(pool)
        .await?;

    for table in registry.tables() {
        for sql in table_ddl(registry.schema(), table) {
            tracing::debug!(sql = %sql, "migration");
            sqlx::query(&sql).execute(pool).await?;
        }
    }
    tracing::info!(schema = %registry.schema(), tables = registry.tables().len(), "migrations applied");
    Ok(())
}
