//! Typed entity records
//!
//! The row codec decodes spreadsheet rows into these shapes and the
//! import orchestrator writes them through the storage port. Export
//! rebuilds them from stored records before encoding.

use chrono::NaiveDate;

use crate::errors::{Error, Result};
use crate::storage::{Fields, Kind, Record, Store, Value, field};

fn require_str(kind: &'static str, record: &Record, name: &'static str) -> Result<String> {
    record
        .str(name)
        .map(str::to_string)
        .ok_or(Error::CorruptRecord {
            kind,
            id: record.id,
            field: name,
        })
}

fn require_int(kind: &'static str, record: &Record, name: &'static str) -> Result<i64> {
    record.int(name).ok_or(Error::CorruptRecord {
        kind,
        id: record.id,
        field: name,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub link: String,
}

impl Location {
    pub fn fields(&self) -> Fields {
        vec![
            field("id", self.id),
            field("name", self.name.as_str()),
            field("address", self.address.as_str()),
            field("link", self.link.as_str()),
        ]
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Location {
            id: record.id,
            name: require_str("location", record, "name")?,
            address: record.str("address").unwrap_or_default().to_string(),
            link: record.str("link").unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    /// Derived from the name: lowercased, spaces replaced with hyphens
    pub slug: String,
    pub date: NaiveDate,
    pub active: bool,
    pub fk_location: i64,
}

impl Event {
    pub fn fields(&self) -> Fields {
        vec![
            field("id", self.id),
            field("name", self.name.as_str()),
            field("slug", self.slug.as_str()),
            field("date", self.date),
            field("active", self.active),
            field("fk_location", self.fk_location),
        ]
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Event {
            id: record.id,
            name: require_str("event", record, "name")?,
            slug: record.str("slug").unwrap_or_default().to_string(),
            date: record.date("date").ok_or(Error::CorruptRecord {
                kind: "event",
                id: record.id,
                field: "date",
            })?,
            active: record.bool("active").unwrap_or(false),
            fk_location: require_int("event", record, "fk_location")?,
        })
    }

    /// The unique event currently flagged active. Absence is a
    /// reported error, not a crash.
    pub async fn find_active(store: &mut dyn Store) -> Result<Event> {
        let record = store
            .find(Kind::Event, &[field("active", true)])
            .await?
            .ok_or(Error::MissingActiveEvent)?;
        Event::from_record(&record)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub id: i64,
    pub name: String,
    pub value: i64,
}

impl Batch {
    pub fn fields(&self) -> Fields {
        vec![
            field("id", self.id),
            field("name", self.name.as_str()),
            field("value", self.value),
        ]
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Batch {
            id: record.id,
            name: require_str("batch", record, "name")?,
            value: require_int("batch", record, "value")?,
        })
    }
}

/// A person as carried by a spreadsheet row. The name is the natural
/// key (pre-lowercased by the codec); persistence assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub contact: String,
}

impl Person {
    pub fn fields(&self) -> Fields {
        vec![
            field("name", self.name.as_str()),
            field("contact", self.contact.as_str()),
        ]
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Person {
            name: require_str("person", record, "name")?,
            contact: record.str("contact").unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub fk_event: i64,
    pub fk_batch: i64,
    /// Assigned once the person has been reconciled
    pub fk_person: Option<i64>,
    pub value: i64,
    pub notes: String,
}

impl Ticket {
    pub fn fields(&self) -> Fields {
        let mut fields = vec![
            field("id", self.id),
            field("fk_event", self.fk_event),
            field("fk_batch", self.fk_batch),
        ];
        if let Some(fk_person) = self.fk_person {
            fields.push(field("fk_person", fk_person));
        }
        fields.push(field("value", self.value));
        fields.push(field("notes", self.notes.as_str()));
        fields
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Ticket {
            id: record.id,
            fk_event: require_int("ticket", record, "fk_event")?,
            fk_batch: require_int("ticket", record, "fk_batch")?,
            fk_person: record.int("fk_person"),
            value: require_int("ticket", record, "value")?,
            notes: record.str("notes").unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaffMember {
    pub id: i64,
    pub fk_person: Option<i64>,
}

impl StaffMember {
    pub fn fields(&self) -> Fields {
        let mut fields = vec![field("id", self.id)];
        if let Some(fk_person) = self.fk_person {
            fields.push(field("fk_person", fk_person));
        }
        fields
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(StaffMember {
            id: record.id,
            fk_person: record.int("fk_person"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    /// Lowercased on decode
    pub username: String,
    pub fk_person: Option<i64>,
}

impl User {
    pub fn fields(&self) -> Fields {
        let mut fields = vec![
            field("id", self.id),
            field("username", self.username.as_str()),
        ];
        if let Some(fk_person) = self.fk_person {
            fields.push(field("fk_person", fk_person));
        }
        fields
    }

    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(User {
            id: record.id,
            username: require_str("user", record, "username")?,
            fk_person: record.int("fk_person"),
        })
    }
}
