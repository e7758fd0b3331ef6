//! Table registry: every record table known to the process, registered explicitly at startup.

use std::collections::HashMap;

/// Column storage type. Drives both DDL and parameter casts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    SmallInt,
    Integer,
    BigInt,
    Double,
    Timestamptz,
}

impl SqlType {
    pub fn pg_name(self) -> &'static str {
        match self {
            SqlType::Text => "text",
            SqlType::SmallInt => "smallint",
            SqlType::Integer => "integer",
            SqlType::BigInt => "bigint",
            SqlType::Double => "double precision",
            SqlType::Timestamptz => "timestamptz",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        ColumnDef {
            name,
            sql_type,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, sql_type: SqlType) -> Self {
        ColumnDef {
            name,
            sql_type,
            nullable: true,
        }
    }
}

/// Store-managed columns present on every table, in select order.
pub const META_COLUMNS: [(&str, SqlType); 3] = [
    ("id", SqlType::BigInt),
    ("created_at", SqlType::Timestamptz),
    ("updated_at", SqlType::Timestamptz),
];

#[derive(Clone, Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: Vec<ColumnDef>,
    /// Business key used for latest-per-key views. Indexed with (created_at DESC, id DESC).
    pub group_key: Option<&'static str>,
    /// Columns that get a UNIQUE index.
    pub unique: Vec<&'static str>,
}

impl TableDef {
    pub fn new(name: &'static str, columns: Vec<ColumnDef>) -> Self {
        TableDef {
            name,
            columns,
            group_key: None,
            unique: Vec::new(),
        }
    }

    pub fn group_key(mut self, column: &'static str) -> Self {
        self.group_key = Some(column);
        self
    }

    pub fn unique(mut self, column: &'static str) -> Self {
        self.unique.push(column);
        self
    }

    /// Resource column or one of the meta columns.
    pub fn column_type(&self, name: &str) -> Option<SqlType> {
        META_COLUMNS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
            .or_else(|| self.columns.iter().find(|c| c.name == name).map(|c| c.sql_type))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    /// Every selectable column name: meta columns first, then resource columns in definition order.
    pub fn select_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        META_COLUMNS.iter().map(|(n, _)| *n).chain(self.columns.iter().map(|c| c.name))
    }
}

#[derive(Clone, Debug)]
pub struct TableRegistry {
    schema: String,
    tables: Vec<TableDef>,
    by_name: HashMap<&'static str, usize>,
}

impl TableRegistry {
    pub fn new(schema: impl Into<String>) -> Self {
        TableRegistry {
            schema: schema.into(),
            tables: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a table. A later registration under the same name replaces the earlier one.
    pub fn register(mut self, table: TableDef) -> Self {
        match self.by_name.get(table.name) {
            Some(&idx) => self.tables[idx] = table,
            None => {
                self.by_name.insert(table.name, self.tables.len());
                self.tables.push(table);
            }
        }
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.by_name.get(name).map(|&idx| &self.tables[idx])
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }
}
