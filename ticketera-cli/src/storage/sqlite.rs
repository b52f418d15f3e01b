//! SQLite-backed store
//!
//! SQL is assembled from the static column tables in [`Kind`]; user
//! data only ever travels through bound parameters.

use std::str::FromStr;

use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::query::Query;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{ColumnType, Fields, Kind, Record, Store, Value};
use crate::errors::Result;

/// Open (or create) the database and bootstrap the schema.
///
/// The pool is capped at one connection: an open import transaction
/// owns the whole session, so no other statement can interleave with
/// it on the same logical connection.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // raw_sql: the schema is many statements, prepared queries take one
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

// person.name is COLLATE NOCASE: the person natural key is matched
// case-insensitively, everything else exactly.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS location (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT,
    link TEXT
);
CREATE TABLE IF NOT EXISTS event (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    date TEXT,
    active INTEGER NOT NULL DEFAULT 0,
    fk_location INTEGER REFERENCES location(id)
);
CREATE TABLE IF NOT EXISTS batch (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    value INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE,
    contact TEXT
);
CREATE TABLE IF NOT EXISTS ticket (
    id INTEGER PRIMARY KEY,
    fk_event INTEGER REFERENCES event(id),
    fk_batch INTEGER REFERENCES batch(id),
    fk_person INTEGER REFERENCES person(id),
    value INTEGER,
    notes TEXT
);
CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY,
    fk_person INTEGER REFERENCES person(id)
);
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    password TEXT,
    password_update INTEGER NOT NULL DEFAULT 0,
    fk_role INTEGER REFERENCES role(id),
    fk_person INTEGER REFERENCES person(id)
);
CREATE TABLE IF NOT EXISTS session (
    id INTEGER PRIMARY KEY,
    fk_user INTEGER REFERENCES user(id),
    refresh_token TEXT
);
CREATE TABLE IF NOT EXISTS role (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
"#;

/// Store over a borrowed connection; works both on a pool connection
/// and on an open transaction.
pub struct SqliteStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        SqliteStore { conn }
    }
}

fn where_clause(predicate: &[(String, Value)]) -> String {
    if predicate.is_empty() {
        return "1 = 1".to_string();
    }
    predicate
        .iter()
        .map(|(name, _)| format!("{name} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(Option::<i64>::None),
        Value::Text(s) => query.bind(s.clone()),
        Value::Int(i) => query.bind(*i),
        Value::Bool(b) => query.bind(*b),
        Value::Date(d) => query.bind(*d),
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: impl IntoIterator<Item = &'q (String, Value)>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for (_, value) in values {
        query = bind_value(query, value);
    }
    query
}

fn row_to_record(kind: Kind, row: &SqliteRow) -> Result<Record> {
    let id: i64 = row.try_get("id")?;
    let mut fields = Fields::new();
    for column in kind.columns() {
        let value = match column.ty {
            ColumnType::Int => row
                .try_get::<Option<i64>, _>(column.name)?
                .map(Value::Int),
            ColumnType::Text => row
                .try_get::<Option<String>, _>(column.name)?
                .map(Value::Text),
            ColumnType::Bool => row
                .try_get::<Option<bool>, _>(column.name)?
                .map(Value::Bool),
            ColumnType::Date => row
                .try_get::<Option<NaiveDate>, _>(column.name)?
                .map(Value::Date),
        };
        fields.push((column.name.to_string(), value.unwrap_or(Value::Null)));
    }
    Ok(Record { id, fields })
}

#[async_trait]
impl Store for SqliteStore<'_> {
    async fn find(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} LIMIT 1",
            kind.table(),
            where_clause(predicate)
        );
        let row = bind_all(sqlx::query(&sql), predicate)
            .fetch_optional(&mut *self.conn)
            .await?;
        row.map(|row| row_to_record(kind, &row)).transpose()
    }

    async fn filter(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY id",
            kind.table(),
            where_clause(predicate)
        );
        let rows = bind_all(sqlx::query(&sql), predicate)
            .fetch_all(&mut *self.conn)
            .await?;
        rows.iter().map(|row| row_to_record(kind, row)).collect()
    }

    async fn create(&mut self, kind: Kind, fields: Fields) -> Result<i64> {
        let names = fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            kind.table()
        );
        let result = bind_all(sqlx::query(&sql), &fields)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update(&mut self, kind: Kind, predicate: &[(String, Value)], fields: Fields) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let assignments = fields
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {}",
            kind.table(),
            where_clause(predicate)
        );
        let query = bind_all(sqlx::query(&sql), &fields);
        let result = bind_all(query, predicate)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn remove(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            kind.table(),
            where_clause(predicate)
        );
        let result = bind_all(sqlx::query(&sql), predicate)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::field;

    async fn test_pool() -> SqlitePool {
        connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn create_find_update_remove() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut store = SqliteStore::new(&mut conn);

        let id = store
            .create(Kind::Batch, vec![field("name", "Tanda 1"), field("value", 1000i64)])
            .await
            .unwrap();

        let found = store
            .find(Kind::Batch, &[field("id", id)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.str("name"), Some("Tanda 1"));
        assert_eq!(found.int("value"), Some(1000));

        let count = store
            .update(Kind::Batch, &[field("id", id)], vec![field("value", 1500i64)])
            .await
            .unwrap();
        assert_eq!(count, 1);
        let found = store
            .find(Kind::Batch, &[field("id", id)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.int("value"), Some(1500));

        let removed = store.remove(Kind::Batch, &[field("id", id)]).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store
            .find(Kind::Batch, &[field("id", id)])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn create_honors_explicit_id() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut store = SqliteStore::new(&mut conn);

        let id = store
            .create(
                Kind::Location,
                vec![field("id", 42i64), field("name", "Club X")],
            )
            .await
            .unwrap();
        assert_eq!(id, 42);
    }

    #[tokio::test]
    async fn person_name_matches_case_insensitively() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut store = SqliteStore::new(&mut conn);

        store
            .create(
                Kind::Person,
                vec![field("name", "ana gomez"), field("contact", "ana@x.com")],
            )
            .await
            .unwrap();

        let found = store
            .find(Kind::Person, &[field("name", "Ana Gomez")])
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn upsert_updates_in_place() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut store = SqliteStore::new(&mut conn);

        let first = store
            .upsert(
                Kind::Person,
                &[field("name", "ana gomez")],
                vec![field("name", "ana gomez"), field("contact", "ana@x.com")],
            )
            .await
            .unwrap();
        let second = store
            .upsert(
                Kind::Person,
                &[field("name", "ana gomez")],
                vec![field("name", "ana gomez"), field("contact", "ana@y.com")],
            )
            .await
            .unwrap();

        assert_eq!(first, second);
        let people = store.filter(Kind::Person, &[]).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].str("contact"), Some("ana@y.com"));
    }

    #[tokio::test]
    async fn roles_persist_like_any_kind() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut store = SqliteStore::new(&mut conn);

        let id = store
            .create(Kind::Role, vec![field("name", "admin")])
            .await
            .unwrap();
        let role = store
            .find(Kind::Role, &[field("id", id)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(role.str("name"), Some("admin"));
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let pool = test_pool().await;

        let mut tx = pool.begin().await.unwrap();
        SqliteStore::new(&mut tx)
            .create(Kind::Batch, vec![field("name", "Tanda 1"), field("value", 1i64)])
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let batches = SqliteStore::new(&mut conn)
            .filter(Kind::Batch, &[])
            .await
            .unwrap();
        assert!(batches.is_empty());
    }
}
