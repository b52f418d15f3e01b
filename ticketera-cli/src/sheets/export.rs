//! Export orchestrators
//!
//! [`global_export`] renders the whole database, one sheet per entity
//! kind, in the same fixed order the bulk import consumes.
//! [`ticket_export`] renders the door list of a single event, sorted
//! by person name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::SqlitePool;

use super::codec::{
    cols, encode_batch, encode_event, encode_list_ticket, encode_location, encode_staff,
    encode_ticket, encode_user,
};
use super::names;
use super::workbook::{Cell, SheetData, write_workbook};
use crate::errors::{Error, Result};
use crate::records::{Batch, Event, Location, Person, StaffMember, Ticket, User};
use crate::storage::sqlite::SqliteStore;
use crate::storage::{Kind, Record, Store, field};

/// People indexed by id, for joining dependent kinds
async fn people_by_id(store: &mut dyn Store) -> Result<HashMap<i64, Person>> {
    let mut people = HashMap::new();
    for record in store.filter(Kind::Person, &[]).await? {
        people.insert(record.id, Person::from_record(&record)?);
    }
    Ok(people)
}

fn join_person<'p>(
    people: &'p HashMap<i64, Person>,
    kind: &'static str,
    record: &Record,
) -> Result<&'p Person> {
    let fk_person = record.int("fk_person").ok_or(Error::CorruptRecord {
        kind,
        id: record.id,
        field: "fk_person",
    })?;
    people.get(&fk_person).ok_or(Error::CorruptRecord {
        kind,
        id: record.id,
        field: "fk_person",
    })
}

/// Render every entity kind into its named sheet, in the same order
/// the bulk import consumes them.
pub async fn global_export(store: &mut dyn Store) -> Result<Vec<SheetData>> {
    let people = people_by_id(store).await?;

    let mut locations = Vec::new();
    for record in store.filter(Kind::Location, &[]).await? {
        locations.push(encode_location(&Location::from_record(&record)?));
    }

    let mut events = Vec::new();
    for record in store.filter(Kind::Event, &[]).await? {
        events.push(encode_event(&Event::from_record(&record)?));
    }

    let mut batch_rows = Vec::new();
    for record in store.filter(Kind::Batch, &[]).await? {
        batch_rows.push(encode_batch(&Batch::from_record(&record)?));
    }

    let mut tickets = Vec::new();
    for record in store.filter(Kind::Ticket, &[]).await? {
        let person = join_person(&people, "ticket", &record)?;
        tickets.push(encode_ticket(&Ticket::from_record(&record)?, person));
    }

    let mut staff = Vec::new();
    for record in store.filter(Kind::Staff, &[]).await? {
        let person = join_person(&people, "staff", &record)?;
        staff.push(encode_staff(&StaffMember::from_record(&record)?, person));
    }

    let mut users = Vec::new();
    for record in store.filter(Kind::User, &[]).await? {
        let person = join_person(&people, "user", &record)?;
        // password intentionally never leaves the database
        users.push(encode_user(&User::from_record(&record)?, person));
    }

    Ok(vec![
        SheetData {
            name: names::LUGARES,
            columns: cols::LUGARES,
            rows: locations,
        },
        SheetData {
            name: names::EVENTOS,
            columns: cols::EVENTOS,
            rows: events,
        },
        SheetData {
            name: names::TANDAS,
            columns: cols::TANDAS,
            rows: batch_rows,
        },
        SheetData {
            name: names::ENTRADAS,
            columns: cols::ENTRADAS,
            rows: tickets,
        },
        SheetData {
            name: names::STAFF,
            columns: cols::STAFF,
            rows: staff,
        },
        SheetData {
            name: names::USUARIOS,
            columns: cols::USUARIOS,
            rows: users,
        },
    ])
}

/// Render the door list of one event: its tickets joined with their
/// people, sorted by person name.
pub async fn ticket_export(store: &mut dyn Store, event: &Event) -> Result<SheetData> {
    let people = people_by_id(store).await?;

    let mut joined = Vec::new();
    for record in store
        .filter(Kind::Ticket, &[field("fk_event", event.id)])
        .await?
    {
        let person = join_person(&people, "ticket", &record)?.clone();
        joined.push((Ticket::from_record(&record)?, person));
    }

    joined.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));

    let rows = joined
        .iter()
        .map(|(ticket, person)| encode_list_ticket(ticket, person))
        .collect();

    Ok(SheetData {
        name: names::ENTRADAS,
        columns: cols::LISTA,
        rows,
    })
}

fn export_path(export_dir: &Path) -> PathBuf {
    export_dir.join(format!("{}.xlsx", Utc::now().timestamp_millis()))
}

fn prepare_export_dir(export_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(export_dir)
        .map_err(|e| Error::Workbook(format!("failed to create {}: {e}", export_dir.display())))
}

/// Export the whole database to a timestamped workbook file
pub async fn run_global_export(pool: &SqlitePool, export_dir: &Path) -> Result<PathBuf> {
    let mut conn = pool.acquire().await?;
    let sheets = global_export(&mut SqliteStore::new(&mut conn)).await?;

    prepare_export_dir(export_dir)?;
    let path = export_path(export_dir);
    write_workbook(&path, &sheets)?;
    log::info!("exported {} sheets to {}", sheets.len(), path.display());
    Ok(path)
}

/// Export the active event's door list to a timestamped workbook file.
/// With no active event this fails before any file is written.
pub async fn run_ticket_export(pool: &SqlitePool, export_dir: &Path) -> Result<PathBuf> {
    let mut conn = pool.acquire().await?;
    let mut store = SqliteStore::new(&mut conn);
    let event = Event::find_active(&mut store).await?;
    let sheet = ticket_export(&mut store, &event).await?;

    prepare_export_dir(export_dir)?;
    let path = export_path(export_dir);
    write_workbook(&path, &[sheet])?;
    log::info!(
        "exported door list for event {} to {}",
        event.id,
        path.display()
    );
    Ok(path)
}
