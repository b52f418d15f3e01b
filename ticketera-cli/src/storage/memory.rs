//! In-memory store for tests
//!
//! Backs the reconciler and orchestrator tests without a real
//! database. Matching semantics mirror the SQLite store: person names
//! compare case-insensitively, everything else exactly.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Fields, Kind, Record, Store, Value};
use crate::errors::Result;

#[derive(Debug, Default)]
pub struct MemStore {
    tables: HashMap<Kind, Vec<Record>>,
    next_id: i64,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore {
            tables: HashMap::new(),
            next_id: 1,
        }
    }

    fn matches(kind: Kind, record: &Record, predicate: &[(String, Value)]) -> bool {
        predicate.iter().all(|(name, wanted)| {
            if name == "id" {
                return wanted.as_int() == Some(record.id);
            }
            let actual = record.get(name).unwrap_or(&Value::Null);
            if kind == Kind::Person && name == "name" {
                if let (Some(a), Some(b)) = (actual.as_str(), wanted.as_str()) {
                    return a.to_lowercase() == b.to_lowercase();
                }
            }
            actual == wanted
        })
    }
}

#[async_trait]
impl Store for MemStore {
    async fn find(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Option<Record>> {
        Ok(self
            .tables
            .get(&kind)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| Self::matches(kind, record, predicate))
            })
            .cloned())
    }

    async fn filter(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<Vec<Record>> {
        Ok(self
            .tables
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| Self::matches(kind, record, predicate))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&mut self, kind: Kind, mut fields: Fields) -> Result<i64> {
        let explicit = fields.iter().position(|(name, _)| name == "id");
        let id = match explicit {
            Some(index) => {
                let (_, value) = fields.remove(index);
                value.as_int().unwrap_or(self.next_id)
            }
            None => self.next_id,
        };
        self.next_id = self.next_id.max(id + 1);
        self.tables
            .entry(kind)
            .or_default()
            .push(Record { id, fields });
        Ok(id)
    }

    async fn update(&mut self, kind: Kind, predicate: &[(String, Value)], fields: Fields) -> Result<u64> {
        let mut count = 0;
        if let Some(records) = self.tables.get_mut(&kind) {
            for record in records.iter_mut() {
                if !Self::matches(kind, record, predicate) {
                    continue;
                }
                for (name, value) in &fields {
                    if name == "id" {
                        continue;
                    }
                    match record.fields.iter_mut().find(|(f, _)| f == name) {
                        Some((_, slot)) => *slot = value.clone(),
                        None => record.fields.push((name.clone(), value.clone())),
                    }
                }
                count += 1;
            }
        }
        Ok(count)
    }

    async fn remove(&mut self, kind: Kind, predicate: &[(String, Value)]) -> Result<u64> {
        let Some(records) = self.tables.get_mut(&kind) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|record| !Self::matches(kind, record, predicate));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::field;

    #[tokio::test]
    async fn assigns_monotonic_ids() {
        let mut store = MemStore::new();
        let a = store
            .create(Kind::Person, vec![field("name", "a")])
            .await
            .unwrap();
        let b = store
            .create(Kind::Person, vec![field("name", "b")])
            .await
            .unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn explicit_id_advances_counter() {
        let mut store = MemStore::new();
        store
            .create(Kind::Location, vec![field("id", 10i64), field("name", "x")])
            .await
            .unwrap();
        let next = store
            .create(Kind::Location, vec![field("name", "y")])
            .await
            .unwrap();
        assert_eq!(next, 11);
    }

    #[tokio::test]
    async fn person_lookup_is_case_insensitive() {
        let mut store = MemStore::new();
        store
            .create(Kind::Person, vec![field("name", "ana gomez")])
            .await
            .unwrap();
        let found = store
            .find(Kind::Person, &[field("name", "ANA GOMEZ")])
            .await
            .unwrap();
        assert!(found.is_some());

        // other kinds stay exact
        store
            .create(Kind::Batch, vec![field("name", "Tanda 1")])
            .await
            .unwrap();
        let found = store
            .find(Kind::Batch, &[field("name", "tanda 1")])
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
