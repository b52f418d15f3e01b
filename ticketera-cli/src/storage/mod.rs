//! Storage port for the back office
//!
//! Records move through the system as dynamic field sets so the same
//! reconciliation code works for every entity kind. The [`Store`] trait
//! is the single seam between domain logic and persistence: production
//! code runs it against SQLite, tests against an in-memory table set.

pub mod sqlite;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;

/// A single persisted value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Convert to JSON for terminal output
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::json!(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

/// Ordered set of named values; used both as write payload and as
/// equality predicate (every pair must match).
pub type Fields = Vec<(String, Value)>;

/// Build a single field pair
pub fn field(name: &str, value: impl Into<Value>) -> (String, Value) {
    (name.to_string(), value.into())
}

/// A persisted record: surrogate id plus its column values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub fields: Fields,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(Value::as_date)
    }

    /// Render as a JSON object for terminal output; `skip` drops
    /// sensitive fields (passwords are never shown)
    pub fn to_json(&self, skip: &[&str]) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), serde_json::json!(self.id));
        for (name, value) in &self.fields {
            if skip.contains(&name.as_str()) {
                continue;
            }
            obj.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(obj)
    }
}

/// Entity kinds persisted by the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Location,
    Event,
    Batch,
    Person,
    Ticket,
    Staff,
    User,
    Session,
    Role,
}

/// Column value shape, used to read rows back generically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Text,
    Bool,
    Date,
}

/// A column of an entity table (id is implicit on every kind)
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column { name, ty }
}

impl Kind {
    pub fn table(self) -> &'static str {
        match self {
            Kind::Location => "location",
            Kind::Event => "event",
            Kind::Batch => "batch",
            Kind::Person => "person",
            Kind::Ticket => "ticket",
            Kind::Staff => "staff",
            Kind::User => "user",
            Kind::Session => "session",
            Kind::Role => "role",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        use ColumnType::{Bool, Date, Int, Text};
        match self {
            Kind::Location => &const {
                [
                    col("name", Text),
                    col("address", Text),
                    col("link", Text),
                ]
            },
            Kind::Event => &const {
                [
                    col("name", Text),
                    col("slug", Text),
                    col("date", Date),
                    col("active", Bool),
                    col("fk_location", Int),
                ]
            },
            Kind::Batch => &const { [col("name", Text), col("value", Int)] },
            Kind::Person => &const { [col("name", Text), col("contact", Text)] },
            Kind::Ticket => &const {
                [
                    col("fk_event", Int),
                    col("fk_batch", Int),
                    col("fk_person", Int),
                    col("value", Int),
                    col("notes", Text),
                ]
            },
            Kind::Staff => &const { [col("fk_person", Int)] },
            Kind::User => &const {
                [
                    col("username", Text),
                    col("password", Text),
                    col("password_update", Bool),
                    col("fk_role", Int),
                    col("fk_person", Int),
                ]
            },
            Kind::Session => &const { [col("fk_user", Int), col("refresh_token", Text)] },
            Kind::Role => &const { [col("name", Text)] },
        }
    }
}

/// The storage collaborator: lookup, filtering and writes keyed by
/// field-equality predicates. Person name comparisons are
/// case-insensitive; everything else matches exactly.
#[async_trait]
pub trait Store: Send {
    /// First record of `kind` matching the predicate, if any
    async fn find(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Option<Record>>;

    /// All records of `kind` matching the predicate (empty predicate
    /// selects everything)
    async fn filter(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Vec<Record>>;

    /// Insert a record, returning its id (honors an explicit "id" field)
    async fn create(&mut self, kind: Kind, fields: Fields) -> Result<i64>;

    /// Overwrite the given fields on every matching record
    async fn update(&mut self, kind: Kind, predicate: &[(String, Value)], fields: Fields) -> Result<u64>;

    /// Delete matching records, returning the count removed
    async fn remove(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<u64>;

    /// Found -> update in place, not found -> create; returns the id
    /// either way
    async fn upsert(&mut self, kind: Kind, key: &[(String, Value)], fields: Fields) -> Result<i64> {
        match self.find(kind, key).await? {
            Some(existing) => {
                self.update(kind, key, fields).await?;
                Ok(existing.id)
            }
            None => self.create(kind, fields).await,
        }
    }
}
