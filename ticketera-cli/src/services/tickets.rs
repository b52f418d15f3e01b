//! Ticket CRUD for the active event

use crate::errors::{Error, Result};
use crate::records::{Event, Person};
use crate::sheets::reconcile::reconcile_person;
use crate::storage::{Fields, Kind, Record, Store, field};

/// Tickets for one event, each joined to its person (tickets created
/// without a person carry `None`).
pub async fn filter(
    store: &mut dyn Store,
    event: &Event,
) -> Result<Vec<(Record, Option<Record>)>> {
    let tickets = store
        .filter(Kind::Ticket, &[field("fk_event", event.id)])
        .await?;

    let mut joined = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let person = match ticket.int("fk_person") {
            Some(fk_person) => store.find(Kind::Person, &[field("id", fk_person)]).await?,
            None => None,
        };
        joined.push((ticket, person));
    }
    Ok(joined)
}

/// Create one ticket against the event, reconciling the person by name
/// and pricing it from the batch.
pub async fn create(
    store: &mut dyn Store,
    event: &Event,
    person: &Person,
    fk_batch: i64,
    notes: &str,
) -> Result<i64> {
    if person.name.trim().is_empty() {
        return Err(Error::bad_request("the name field is required"));
    }

    let batch = store
        .find(Kind::Batch, &[field("id", fk_batch)])
        .await?
        .ok_or_else(|| Error::bad_request(format!("batch {fk_batch} is not defined")))?;
    let value = batch.int("value").ok_or(Error::CorruptRecord {
        kind: "batch",
        id: batch.id,
        field: "value",
    })?;

    let normalized = Person {
        name: person.name.to_lowercase(),
        contact: person.contact.clone(),
    };
    let fk_person = reconcile_person(store, &normalized).await?.id();

    let id = store
        .create(
            Kind::Ticket,
            vec![
                field("fk_event", event.id),
                field("fk_batch", fk_batch),
                field("fk_person", fk_person),
                field("value", value),
                field("notes", notes),
            ],
        )
        .await?;
    log::info!("ticket {id} created for event {}", event.id);
    Ok(id)
}

/// Partial update of one ticket; absent fields keep their value.
pub async fn update(store: &mut dyn Store, id: i64, fields: Fields) -> Result<()> {
    if fields.is_empty() {
        return Err(Error::bad_request("nothing to update"));
    }
    let changed = store
        .update(Kind::Ticket, &[field("id", id)], fields)
        .await?;
    if changed == 0 {
        return Err(Error::bad_request(format!("ticket {id} does not exist")));
    }
    Ok(())
}
