//! Row codec
//!
//! Pure conversions between spreadsheet row shapes (localized column
//! names, string-encoded values) and typed records. Decode is strict:
//! a missing or unparseable required field fails with the sheet, row
//! and field that caused it. Encode is the inverse, except that person
//! names keep their stored display form and dates render in the
//! `DD/MM/YYYY` export format.

use chrono::NaiveDate;

use super::workbook::{Cell, Row};
use crate::errors::{Error, Result};
use crate::records::{Batch, Event, Location, Person, StaffMember, Ticket, User};

/// Column layouts, one per sheet (also the export header order)
pub mod cols {
    pub const LUGARES: &[&str] = &["id", "nombre", "direccion", "link"];
    pub const EVENTOS: &[&str] = &["id", "id_lugar", "nombre", "fecha", "activo"];
    pub const TANDAS: &[&str] = &["id", "nombre", "precio"];
    pub const ENTRADAS: &[&str] = &[
        "id",
        "id_evento",
        "id_tanda",
        "nombre",
        "contacto",
        "precio",
        "notas",
    ];
    pub const STAFF: &[&str] = &["id", "nombre", "contacto"];
    pub const USUARIOS: &[&str] = &["id", "usuario", "nombre", "contacto"];
    pub const LISTA: &[&str] = &["tanda", "nombre", "contacto", "notas"];
}

// decode helpers

fn required<'r>(sheet: &'static str, row: &'r Row, field: &'static str) -> Result<&'r str> {
    row.get(field).ok_or(Error::MalformedRow {
        sheet,
        row: row.index,
        field,
    })
}

fn optional(row: &Row, field: &str) -> String {
    row.get(field).unwrap_or_default().to_string()
}

fn parse_int(sheet: &'static str, row: &Row, field: &'static str) -> Result<i64> {
    required(sheet, row, field)?
        .trim()
        .parse()
        .map_err(|_| Error::MalformedRow {
            sheet,
            row: row.index,
            field,
        })
}

/// Dates arrive as `YYYY-MM-DD`: split on `-`, build the date from its
/// three parts.
fn parse_date(sheet: &'static str, row: &Row, field: &'static str) -> Result<NaiveDate> {
    let raw = required(sheet, row, field)?;
    let malformed = || Error::MalformedRow {
        sheet,
        row: row.index,
        field,
    };
    let mut parts = raw.trim().splitn(3, '-');
    let year = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    let month = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    let day = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}

/// `"SI"` means true, anything else false
fn parse_flag(row: &Row, field: &str) -> bool {
    row.get(field)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("SI"))
}

fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn format_flag(flag: bool) -> &'static str {
    if flag { "SI" } else { "NO" }
}

// per-entity decode

pub fn decode_location(sheet: &'static str, row: &Row) -> Result<Location> {
    Ok(Location {
        id: parse_int(sheet, row, "id")?,
        name: required(sheet, row, "nombre")?.to_string(),
        address: optional(row, "direccion"),
        link: optional(row, "link"),
    })
}

pub fn decode_event(sheet: &'static str, row: &Row) -> Result<Event> {
    let name = required(sheet, row, "nombre")?.to_string();
    Ok(Event {
        id: parse_int(sheet, row, "id")?,
        slug: slugify(&name),
        name,
        date: parse_date(sheet, row, "fecha")?,
        active: parse_flag(row, "activo"),
        fk_location: parse_int(sheet, row, "id_lugar")?,
    })
}

pub fn decode_batch(sheet: &'static str, row: &Row) -> Result<Batch> {
    Ok(Batch {
        id: parse_int(sheet, row, "id")?,
        name: required(sheet, row, "nombre")?.to_string(),
        value: parse_int(sheet, row, "precio")?,
    })
}

pub fn decode_ticket(sheet: &'static str, row: &Row) -> Result<(Ticket, Person)> {
    let ticket = Ticket {
        id: parse_int(sheet, row, "id")?,
        fk_event: parse_int(sheet, row, "id_evento")?,
        fk_batch: parse_int(sheet, row, "id_tanda")?,
        fk_person: None,
        value: parse_int(sheet, row, "precio")?,
        notes: optional(row, "notas"),
    };
    let person = Person {
        name: required(sheet, row, "nombre")?.to_lowercase(),
        contact: optional(row, "contacto"),
    };
    Ok((ticket, person))
}

pub fn decode_staff(sheet: &'static str, row: &Row) -> Result<(StaffMember, Person)> {
    let staff = StaffMember {
        id: parse_int(sheet, row, "id")?,
        fk_person: None,
    };
    let person = Person {
        name: required(sheet, row, "nombre")?.to_lowercase(),
        contact: optional(row, "contacto"),
    };
    Ok((staff, person))
}

pub fn decode_user(sheet: &'static str, row: &Row) -> Result<(User, Person)> {
    let user = User {
        id: parse_int(sheet, row, "id")?,
        username: required(sheet, row, "usuario")?.to_lowercase(),
        fk_person: None,
    };
    let person = Person {
        name: required(sheet, row, "nombre")?.to_lowercase(),
        contact: optional(row, "contacto"),
    };
    Ok((user, person))
}

/// A row of the per-event ticket lists (`Lista`, `Staff`, `Free`).
/// Only `Lista` rows name their batch; the other two sheets map to
/// fixed batches.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub batch: Option<String>,
    pub person: Person,
    pub notes: String,
}

pub fn decode_list_row(sheet: &'static str, row: &Row, with_batch: bool) -> Result<ListRow> {
    let batch = if with_batch {
        Some(required(sheet, row, "tanda")?.to_string())
    } else {
        None
    };
    Ok(ListRow {
        batch,
        person: Person {
            name: required(sheet, row, "nombre")?.to_lowercase(),
            contact: optional(row, "contacto"),
        },
        notes: optional(row, "notas"),
    })
}

// per-entity encode

pub fn encode_location(location: &Location) -> Vec<Cell> {
    vec![
        Cell::Int(location.id),
        Cell::text(&location.name),
        Cell::text(&location.address),
        Cell::text(&location.link),
    ]
}

pub fn encode_event(event: &Event) -> Vec<Cell> {
    vec![
        Cell::Int(event.id),
        Cell::Int(event.fk_location),
        Cell::text(&event.name),
        Cell::text(format_date(event.date)),
        Cell::text(format_flag(event.active)),
    ]
}

pub fn encode_batch(batch: &Batch) -> Vec<Cell> {
    vec![
        Cell::Int(batch.id),
        Cell::text(&batch.name),
        Cell::Int(batch.value),
    ]
}

pub fn encode_ticket(ticket: &Ticket, person: &Person) -> Vec<Cell> {
    vec![
        Cell::Int(ticket.id),
        Cell::Int(ticket.fk_event),
        Cell::Int(ticket.fk_batch),
        Cell::text(&person.name),
        Cell::text(&person.contact),
        Cell::Int(ticket.value),
        Cell::text(&ticket.notes),
    ]
}

pub fn encode_staff(staff: &StaffMember, person: &Person) -> Vec<Cell> {
    vec![
        Cell::Int(staff.id),
        Cell::text(&person.name),
        Cell::text(&person.contact),
    ]
}

pub fn encode_user(user: &User, person: &Person) -> Vec<Cell> {
    vec![
        Cell::Int(user.id),
        Cell::text(&user.username),
        Cell::text(&person.name),
        Cell::text(&person.contact),
    ]
}

/// Batch rendering for the door list export: a couple of batches show
/// as one-letter codes, every other batch as its raw id.
pub fn batch_code(fk_batch: i64) -> Cell {
    match fk_batch {
        4 => Cell::text("p"),
        5 => Cell::text("f"),
        other => Cell::Int(other),
    }
}

pub fn encode_list_ticket(ticket: &Ticket, person: &Person) -> Vec<Cell> {
    vec![
        batch_code(ticket.fk_batch),
        Cell::text(&person.name),
        Cell::text(&person.contact),
        Cell::text(&ticket.notes),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::workbook::sheet_from_rows;

    fn make_row(columns: &[&str], values: &[&str]) -> Row {
        sheet_from_rows("test", columns, &[values]).rows.remove(0)
    }

    fn row_from_cells(columns: &'static [&'static str], cells: &[Cell]) -> Row {
        let values: Vec<String> = cells
            .iter()
            .map(|cell| match cell {
                Cell::Empty => String::new(),
                Cell::Text(s) => s.clone(),
                Cell::Int(i) => i.to_string(),
            })
            .collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        make_row(columns, &refs)
    }

    #[test]
    fn decode_location_row() {
        let row = make_row(cols::LUGARES, &["3", "Club X", "Av. Siempreviva 742", "https://x"]);
        let location = decode_location("Lugares", &row).unwrap();
        assert_eq!(location.id, 3);
        assert_eq!(location.name, "Club X");
        assert_eq!(location.address, "Av. Siempreviva 742");
    }

    #[test]
    fn decode_event_derives_slug_and_date() {
        let row = make_row(cols::EVENTOS, &["1", "2", "Kaos Rave 9", "2024-11-30", "SI"]);
        let event = decode_event("Eventos", &row).unwrap();
        assert_eq!(event.slug, "kaos-rave-9");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2024, 11, 30).unwrap());
        assert!(event.active);
        assert_eq!(event.fk_location, 2);
    }

    #[test]
    fn decode_flag_treats_anything_but_si_as_false() {
        let row = make_row(cols::EVENTOS, &["1", "2", "Kaos", "2024-01-01", "NO"]);
        assert!(!decode_event("Eventos", &row).unwrap().active);
        let row = make_row(cols::EVENTOS, &["1", "2", "Kaos", "2024-01-01", ""]);
        assert!(!decode_event("Eventos", &row).unwrap().active);
    }

    #[test]
    fn decode_rejects_non_numeric_id() {
        let row = make_row(cols::TANDAS, &["x", "Tanda 1", "1000"]);
        let err = decode_batch("Tandas", &row).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedRow {
                sheet: "Tandas",
                row: 1,
                field: "id"
            }
        ));
    }

    #[test]
    fn decode_rejects_malformed_date() {
        let row = make_row(cols::EVENTOS, &["1", "2", "Kaos", "el sabado", "SI"]);
        let err = decode_event("Eventos", &row).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { field: "fecha", .. }));
    }

    #[test]
    fn decode_ticket_lowercases_person_name() {
        let row = make_row(
            cols::ENTRADAS,
            &["9", "1", "4", "Ana Gomez", "ana@x.com", "2000", "paga"],
        );
        let (ticket, person) = decode_ticket("Entradas", &row).unwrap();
        assert_eq!(person.name, "ana gomez");
        assert_eq!(ticket.fk_batch, 4);
        assert_eq!(ticket.value, 2000);
        assert_eq!(ticket.fk_person, None);
    }

    #[test]
    fn decode_user_lowercases_username() {
        let row = make_row(cols::USUARIOS, &["1", "AnaG", "Ana Gomez", "ana@x.com"]);
        let (user, person) = decode_user("Usuarios", &row).unwrap();
        assert_eq!(user.username, "anag");
        assert_eq!(person.name, "ana gomez");
    }

    #[test]
    fn decode_list_row_requires_batch_only_on_lista() {
        let lista = make_row(cols::LISTA, &["Tanda 1", "Ana Gomez", "ana@x.com", ""]);
        let decoded = decode_list_row("Lista", &lista, true).unwrap();
        assert_eq!(decoded.batch.as_deref(), Some("Tanda 1"));
        assert_eq!(decoded.person.name, "ana gomez");

        let staff = make_row(cols::LISTA, &["", "Juan Perez", "", "puerta"]);
        let decoded = decode_list_row("Staff", &staff, false).unwrap();
        assert_eq!(decoded.batch, None);
        assert_eq!(decoded.notes, "puerta");

        let bad = make_row(cols::LISTA, &["", "Juan Perez", "", ""]);
        let err = decode_list_row("Lista", &bad, true).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { field: "tanda", .. }));
    }

    #[test]
    fn location_round_trip() {
        let location = Location {
            id: 3,
            name: "Club X".to_string(),
            address: "Av. Siempreviva 742".to_string(),
            link: "https://x".to_string(),
        };
        let row = row_from_cells(cols::LUGARES, &encode_location(&location));
        assert_eq!(decode_location("Lugares", &row).unwrap(), location);
    }

    #[test]
    fn batch_round_trip() {
        let batch = Batch {
            id: 4,
            name: "Preventa".to_string(),
            value: 2000,
        };
        let row = row_from_cells(cols::TANDAS, &encode_batch(&batch));
        assert_eq!(decode_batch("Tandas", &row).unwrap(), batch);
    }

    #[test]
    fn ticket_round_trip() {
        let ticket = Ticket {
            id: 9,
            fk_event: 1,
            fk_batch: 4,
            fk_person: None,
            value: 2000,
            notes: "paga".to_string(),
        };
        let person = Person {
            name: "ana gomez".to_string(),
            contact: "ana@x.com".to_string(),
        };
        let row = row_from_cells(cols::ENTRADAS, &encode_ticket(&ticket, &person));
        let (decoded_ticket, decoded_person) = decode_ticket("Entradas", &row).unwrap();
        assert_eq!(decoded_ticket, ticket);
        assert_eq!(decoded_person, person);
    }

    #[test]
    fn staff_and_user_round_trips() {
        let person = Person {
            name: "juan perez".to_string(),
            contact: "juan@x.com".to_string(),
        };

        let staff = StaffMember {
            id: 2,
            fk_person: None,
        };
        let row = row_from_cells(cols::STAFF, &encode_staff(&staff, &person));
        let (decoded_staff, decoded_person) = decode_staff("Staff", &row).unwrap();
        assert_eq!(decoded_staff, staff);
        assert_eq!(decoded_person, person);

        let user = User {
            id: 5,
            username: "juanp".to_string(),
            fk_person: None,
        };
        let row = row_from_cells(cols::USUARIOS, &encode_user(&user, &person));
        let (decoded_user, decoded_person) = decode_user("Usuarios", &row).unwrap();
        assert_eq!(decoded_user, user);
        assert_eq!(decoded_person, person);
    }

    #[test]
    fn event_encodes_localized_date_and_flag() {
        let event = Event {
            id: 1,
            name: "Kaos Rave 9".to_string(),
            slug: "kaos-rave-9".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 30).unwrap(),
            active: true,
            fk_location: 2,
        };
        let cells = encode_event(&event);
        assert_eq!(cells[3], Cell::text("30/11/2024"));
        assert_eq!(cells[4], Cell::text("SI"));
    }

    #[test]
    fn batch_codes_for_door_list() {
        assert_eq!(batch_code(4), Cell::text("p"));
        assert_eq!(batch_code(5), Cell::text("f"));
        assert_eq!(batch_code(1), Cell::Int(1));
        assert_eq!(batch_code(9), Cell::Int(9));
    }
}
