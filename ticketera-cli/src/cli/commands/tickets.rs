//! Ticket command handlers

use anyhow::Result;
use colored::*;
use sqlx::SqlitePool;

use crate::cli::TicketCommands;
use crate::records::{Event, Person};
use crate::services::tickets;
use crate::storage::field;
use crate::storage::sqlite::SqliteStore;

pub async fn handle(pool: &SqlitePool, command: TicketCommands) -> Result<()> {
    let mut tx = pool.begin().await?;
    let mut store = SqliteStore::new(&mut tx);
    let event = Event::find_active(&mut store).await?;

    match command {
        TicketCommands::List => {
            let listed = tickets::filter(&mut store, &event).await?;
            println!(
                "{} {} ({})",
                "Tickets for".bold(),
                event.name,
                listed.len()
            );
            for (ticket, person) in &listed {
                let name = person
                    .as_ref()
                    .and_then(|p| p.str("name"))
                    .unwrap_or("-");
                println!(
                    "  #{} {} ${} {}",
                    ticket.id,
                    name.cyan(),
                    ticket.int("value").unwrap_or(0),
                    ticket.str("notes").unwrap_or("").dimmed()
                );
            }
        }
        TicketCommands::Create {
            name,
            batch,
            contact,
            notes,
        } => {
            let person = Person { name, contact };
            let id = tickets::create(&mut store, &event, &person, batch, &notes).await?;
            println!("{} #{id}", "Ticket created".green());
        }
        TicketCommands::Update {
            id,
            batch,
            notes,
            value,
        } => {
            let mut fields = Vec::new();
            if let Some(batch) = batch {
                fields.push(field("fk_batch", batch));
            }
            if let Some(notes) = notes {
                fields.push(field("notes", notes));
            }
            if let Some(value) = value {
                fields.push(field("value", value));
            }
            tickets::update(&mut store, id, fields).await?;
            println!("{} #{id}", "Ticket updated".green());
        }
    }

    tx.commit().await?;
    Ok(())
}
