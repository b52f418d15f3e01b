//! Natural-key reconciliation
//!
//! Import never blindly inserts: each incoming record is matched
//! against what is already persisted (by id, by lowercased person
//! name, or by a composite key) and either updated in place or
//! created. The tagged result keeps the decision explicit instead of
//! hiding it behind a nullable lookup.

use crate::errors::Result;
use crate::records::Person;
use crate::storage::{Fields, Kind, Store, Value, field};

/// Outcome of reconciling one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Created { id: i64 },
    Updated { id: i64 },
}

impl Reconciled {
    pub fn id(self) -> i64 {
        match self {
            Reconciled::Created { id } | Reconciled::Updated { id } => id,
        }
    }

    pub fn created(self) -> bool {
        matches!(self, Reconciled::Created { .. })
    }
}

/// Look up an existing record of `kind` by `key`; found -> overwrite
/// the supplied fields and keep its id, not found -> create. Person
/// keys match case-insensitively (the store guarantees it), everything
/// else exactly.
pub async fn reconcile(
    store: &mut dyn Store,
    kind: Kind,
    key: &[(String, Value)],
    fields: Fields,
) -> Result<Reconciled> {
    match store.find(kind, key).await? {
        Some(existing) => {
            store.update(kind, key, fields).await?;
            Ok(Reconciled::Updated { id: existing.id })
        }
        None => {
            let id = store.create(kind, fields).await?;
            Ok(Reconciled::Created { id })
        }
    }
}

/// Reconcile a person by their natural key (lowercased name);
/// last write wins on contact.
pub async fn reconcile_person(store: &mut dyn Store, person: &Person) -> Result<Reconciled> {
    reconcile(
        store,
        Kind::Person,
        &[field("name", person.name.as_str())],
        person.fields(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemStore;

    #[tokio::test]
    async fn creates_then_updates_by_id() {
        let mut store = MemStore::new();

        let first = reconcile(
            &mut store,
            Kind::Batch,
            &[field("id", 1i64)],
            vec![field("id", 1i64), field("name", "Tanda 1"), field("value", 1000i64)],
        )
        .await
        .unwrap();
        assert_eq!(first, Reconciled::Created { id: 1 });

        let second = reconcile(
            &mut store,
            Kind::Batch,
            &[field("id", 1i64)],
            vec![field("id", 1i64), field("name", "Tanda 1"), field("value", 1200i64)],
        )
        .await
        .unwrap();
        assert_eq!(second, Reconciled::Updated { id: 1 });

        let batches = store.filter(Kind::Batch, &[]).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].int("value"), Some(1200));
    }

    #[tokio::test]
    async fn person_reconciles_case_insensitively() {
        let mut store = MemStore::new();

        let ana = Person {
            name: "ana gomez".to_string(),
            contact: "ana@x.com".to_string(),
        };
        let created = reconcile_person(&mut store, &ana).await.unwrap();
        assert!(created.created());

        // same natural key, different contact: update in place
        let ana_again = Person {
            name: "Ana Gomez".to_lowercase(),
            contact: "ana@y.com".to_string(),
        };
        let updated = reconcile_person(&mut store, &ana_again).await.unwrap();
        assert_eq!(updated.id(), created.id());
        assert!(!updated.created());

        let people = store.filter(Kind::Person, &[]).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].str("contact"), Some("ana@y.com"));
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_untouched() {
        let mut store = MemStore::new();
        store
            .create(
                Kind::Person,
                vec![field("name", "juan"), field("contact", "juan@x.com")],
            )
            .await
            .unwrap();

        reconcile(
            &mut store,
            Kind::Person,
            &[field("name", "juan")],
            vec![field("name", "juan")],
        )
        .await
        .unwrap();

        let juan = store
            .find(Kind::Person, &[field("name", "juan")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(juan.str("contact"), Some("juan@x.com"));
    }
}
