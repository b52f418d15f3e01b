//! Import orchestrators
//!
//! Two distinct operations share the codec and reconciler:
//!
//! * [`global_import`] upserts the whole database from one workbook.
//!   It is additive: nothing is ever deleted.
//! * [`ticket_replace`] replaces the active event's tickets from the
//!   door lists (`Lista`, `Staff`, `Free`).
//!
//! Both run in two phases inside one transaction: every sheet is fully
//! decoded before the first write, so a malformed row aborts with zero
//! persisted changes, and any storage failure rolls the whole call
//! back.

use std::path::Path;

use sqlx::SqlitePool;

use super::codec::{
    ListRow, decode_batch, decode_event, decode_list_row, decode_location, decode_staff,
    decode_ticket, decode_user,
};
use super::reconcile::{Reconciled, reconcile, reconcile_person};
use super::workbook::{Book, Row, read_workbook};
use super::{batches, names};
use crate::errors::{Error, Result};
use crate::records::{Batch, Event};
use crate::storage::sqlite::SqliteStore;
use crate::storage::{Kind, Store, field};

/// Row counts of a finished import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl ImportSummary {
    fn tally(&mut self, outcome: Reconciled) {
        if outcome.created() {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }
}

fn decode_sheet<T>(
    book: &Book,
    sheet: &'static str,
    decode: impl Fn(&'static str, &Row) -> Result<T>,
) -> Result<Vec<T>> {
    book.require_sheet(sheet)?
        .rows
        .iter()
        .map(|row| decode(sheet, row))
        .collect()
}

/// Bulk upsert of every entity kind from one workbook.
///
/// Sheets are written in dependency order: locations before the events
/// that reference them, batches before tickets, and each person before
/// the ticket/staff/user row that points at them.
pub async fn global_import(store: &mut dyn Store, book: &Book) -> Result<ImportSummary> {
    // decode phase: nothing is written until every sheet parses
    let locations = decode_sheet(book, names::LUGARES, decode_location)?;
    let events = decode_sheet(book, names::EVENTOS, decode_event)?;
    let batch_rows = decode_sheet(book, names::TANDAS, decode_batch)?;
    let tickets = decode_sheet(book, names::ENTRADAS, decode_ticket)?;
    let staff = decode_sheet(book, names::STAFF, decode_staff)?;
    let users = decode_sheet(book, names::USUARIOS, decode_user)?;

    let mut summary = ImportSummary::default();

    for location in &locations {
        let outcome = reconcile(
            store,
            Kind::Location,
            &[field("id", location.id)],
            location.fields(),
        )
        .await?;
        summary.tally(outcome);
    }
    log::debug!("{}: {} rows", names::LUGARES, locations.len());

    for event in &events {
        let outcome =
            reconcile(store, Kind::Event, &[field("id", event.id)], event.fields()).await?;
        summary.tally(outcome);
    }
    log::debug!("{}: {} rows", names::EVENTOS, events.len());

    for batch in &batch_rows {
        let outcome =
            reconcile(store, Kind::Batch, &[field("id", batch.id)], batch.fields()).await?;
        summary.tally(outcome);
    }
    log::debug!("{}: {} rows", names::TANDAS, batch_rows.len());

    for (mut ticket, person) in tickets {
        ticket.fk_person = Some(reconcile_person(store, &person).await?.id());
        let outcome =
            reconcile(store, Kind::Ticket, &[field("id", ticket.id)], ticket.fields()).await?;
        summary.tally(outcome);
    }

    for (mut member, person) in staff {
        member.fk_person = Some(reconcile_person(store, &person).await?.id());
        let outcome =
            reconcile(store, Kind::Staff, &[field("id", member.id)], member.fields()).await?;
        summary.tally(outcome);
    }

    for (mut user, person) in users {
        user.fk_person = Some(reconcile_person(store, &person).await?.id());
        let outcome =
            reconcile(store, Kind::User, &[field("id", user.id)], user.fields()).await?;
        summary.tally(outcome);
    }

    log::info!(
        "global import finished: {} created, {} updated",
        summary.created,
        summary.updated
    );
    Ok(summary)
}

/// A planned ticket insert for the per-event replace
struct PlannedTicket {
    fk_batch: i64,
    value: i64,
    row: ListRow,
}

fn match_batch<'b>(available: &'b [Batch], wanted: &str) -> Option<&'b Batch> {
    available
        .iter()
        .find(|batch| batch.name.eq_ignore_ascii_case(wanted) || batch.id.to_string() == wanted)
}

fn fixed_batch(available: &[Batch], id: i64) -> Result<&Batch> {
    available
        .iter()
        .find(|batch| batch.id == id)
        .ok_or_else(|| Error::bad_request(format!("batch {id} is not defined")))
}

fn plan_sheet(
    book: &Book,
    sheet: &'static str,
    available: &[Batch],
    fixed: Option<&Batch>,
) -> Result<Vec<PlannedTicket>> {
    let mut planned = Vec::new();
    for row in &book.require_sheet(sheet)?.rows {
        let decoded = decode_list_row(sheet, row, fixed.is_none())?;
        let batch = match fixed {
            Some(batch) => batch,
            // Lista rows name their batch, by name or by raw id
            None => match_batch(available, decoded.batch.as_deref().unwrap_or_default())
                .ok_or(Error::MalformedRow {
                    sheet,
                    row: row.index,
                    field: "tanda",
                })?,
        };
        planned.push(PlannedTicket {
            fk_batch: batch.id,
            value: batch.value,
            row: decoded,
        });
    }
    Ok(planned)
}

/// Replace every ticket of `event` with the rows of the three door
/// list sheets. The event is passed in explicitly; resolving the
/// active one is the caller's job.
pub async fn ticket_replace(
    store: &mut dyn Store,
    event: &Event,
    book: &Book,
) -> Result<ImportSummary> {
    // all three sheets must exist before anything is parsed
    book.require_sheet(names::LISTA)?;
    book.require_sheet(names::STAFF)?;
    book.require_sheet(names::FREE)?;

    let available: Vec<Batch> = store
        .filter(Kind::Batch, &[])
        .await?
        .iter()
        .map(Batch::from_record)
        .collect::<Result<_>>()?;

    let staff_batch = fixed_batch(&available, batches::STAFF)?;
    let free_batch = fixed_batch(&available, batches::FREE)?;

    let mut planned = plan_sheet(book, names::LISTA, &available, None)?;
    planned.extend(plan_sheet(book, names::STAFF, &available, Some(staff_batch))?);
    planned.extend(plan_sheet(book, names::FREE, &available, Some(free_batch))?);

    // write phase: drop the event's old tickets, insert the new list
    let mut summary = ImportSummary::default();
    summary.removed = store
        .remove(Kind::Ticket, &[field("fk_event", event.id)])
        .await? as usize;

    for ticket in planned {
        let fk_person = store
            .upsert(
                Kind::Person,
                &[field("name", ticket.row.person.name.as_str())],
                ticket.row.person.fields(),
            )
            .await?;
        store
            .create(
                Kind::Ticket,
                vec![
                    field("fk_event", event.id),
                    field("fk_batch", ticket.fk_batch),
                    field("fk_person", fk_person),
                    field("value", ticket.value),
                    field("notes", ticket.row.notes.as_str()),
                ],
            )
            .await?;
        summary.created += 1;
    }

    log::info!(
        "ticket replace for event {}: {} removed, {} inserted",
        event.id,
        summary.removed,
        summary.created
    );
    Ok(summary)
}

/// Read a workbook and run [`global_import`] as one transaction:
/// either every row commits or none do.
pub async fn run_global_import(pool: &SqlitePool, path: &Path) -> Result<ImportSummary> {
    let book = read_workbook(path)?;
    let mut tx = pool.begin().await?;
    let result = global_import(&mut SqliteStore::new(&mut tx), &book).await;
    match result {
        Ok(summary) => {
            tx.commit().await?;
            Ok(summary)
        }
        Err(error) => {
            tx.rollback().await?;
            Err(error)
        }
    }
}

/// Read a workbook, resolve the active event and run
/// [`ticket_replace`] as one transaction.
pub async fn run_ticket_replace(pool: &SqlitePool, path: &Path) -> Result<ImportSummary> {
    let book = read_workbook(path)?;
    let mut tx = pool.begin().await?;
    let mut store = SqliteStore::new(&mut tx);
    let result = match Event::find_active(&mut store).await {
        Ok(event) => ticket_replace(&mut store, &event, &book).await,
        Err(error) => Err(error),
    };
    match result {
        Ok(summary) => {
            tx.commit().await?;
            Ok(summary)
        }
        Err(error) => {
            tx.rollback().await?;
            Err(error)
        }
    }
}
