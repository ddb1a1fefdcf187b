//! Table definition for the plants table
//!
//! The column list here is the single source for the DDL and for every
//! statement the backends issue, so the row mapping in [`crate::types::Plant`]
//! only has to agree with one place.

pub const TABLE: &str = "plants";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key
    Serial,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

pub const COLUMNS: &[Column] = &[
    Column {
        name: "id",
        column_type: ColumnType::Serial,
        nullable: false,
    },
    Column {
        name: "name",
        column_type: ColumnType::Text,
        nullable: true,
    },
    Column {
        name: "species",
        column_type: ColumnType::Text,
        nullable: true,
    },
    Column {
        name: "plan",
        column_type: ColumnType::Text,
        nullable: true,
    },
];

/// SQL flavour of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    fn column_sql(&self, column: &Column) -> String {
        let ty = match (self, column.column_type) {
            (Dialect::Postgres, ColumnType::Serial) => "BIGSERIAL PRIMARY KEY",
            (Dialect::Sqlite, ColumnType::Serial) => "INTEGER PRIMARY KEY AUTOINCREMENT",
            (_, ColumnType::Text) => "TEXT",
        };
        if column.nullable || column.column_type == ColumnType::Serial {
            format!("{} {}", column.name, ty)
        } else {
            format!("{} {} NOT NULL", column.name, ty)
        }
    }
}

/// Statements issued by a store. Both dialects accept `$N` placeholders.
#[derive(Debug, Clone)]
pub struct Queries {
    pub create_table: String,
    pub select_all: String,
    pub select_one: String,
    pub insert: String,
    pub upsert: String,
    pub delete: String,
}

impl Queries {
    pub fn for_dialect(dialect: Dialect) -> Self {
        let all: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
        let data: Vec<&str> = COLUMNS
            .iter()
            .filter(|c| c.column_type != ColumnType::Serial)
            .map(|c| c.name)
            .collect();
        let select_list = all.join(", ");

        let column_defs: Vec<String> = COLUMNS.iter().map(|c| dialect.column_sql(c)).collect();
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            TABLE,
            column_defs.join(", ")
        );

        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            TABLE,
            data.join(", "),
            placeholders(data.len()),
            select_list
        );

        let updates: Vec<String> = data
            .iter()
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();
        let upsert = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) DO UPDATE SET {} RETURNING {}",
            TABLE,
            select_list,
            placeholders(all.len()),
            updates.join(", "),
            select_list
        );

        Self {
            create_table,
            select_all: format!("SELECT {} FROM {} ORDER BY id", select_list, TABLE),
            select_one: format!("SELECT {} FROM {} WHERE id = $1", select_list, TABLE),
            insert,
            upsert,
            delete: format!("DELETE FROM {} WHERE id = $1", TABLE),
        }
    }
}

fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}
