//! Spreadsheet import and export
//!
//! The back office moves its data in and out as xlsx workbooks with
//! one named sheet per entity kind. Import parses every row up front,
//! reconciles each record against what is already persisted and
//! commits the whole workbook as a single transaction. Export is the
//! inverse: fetch, join people, encode, write.

pub mod codec;
pub mod export;
pub mod import;
pub mod reconcile;
pub mod workbook;

pub use export::{global_export, run_global_export, run_ticket_export, ticket_export};
pub use import::{ImportSummary, global_import, run_global_import, run_ticket_replace, ticket_replace};
pub use reconcile::{Reconciled, reconcile, reconcile_person};
pub use workbook::{Book, Cell, Row, Sheet, SheetData, read_workbook, write_workbook};

/// Sheet names, shared by both import variants and export
pub mod names {
    pub const LUGARES: &str = "Lugares";
    pub const EVENTOS: &str = "Eventos";
    pub const TANDAS: &str = "Tandas";
    pub const ENTRADAS: &str = "Entradas";
    pub const STAFF: &str = "Staff";
    pub const USUARIOS: &str = "Usuarios";
    pub const LISTA: &str = "Lista";
    pub const FREE: &str = "Free";
}

/// Fixed batches the per-event import maps its extra sheets to
pub mod batches {
    /// Batch backing the `Staff` sheet
    pub const STAFF: i64 = 8;
    /// Batch backing the `Free` sheet
    pub const FREE: i64 = 9;
}
