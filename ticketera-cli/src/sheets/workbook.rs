//! Workbook reading and writing
//!
//! Reading goes through calamine: the first row of each sheet is the
//! header, every following row becomes a column-name -> string map.
//! Writing goes through rust_xlsxwriter, one worksheet per exported
//! entity kind.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;

use crate::errors::{Error, Result};

/// A data row, keyed by header column name. `index` is the 1-based
/// data row number used in error messages.
#[derive(Debug, Clone)]
pub struct Row {
    pub index: usize,
    pub cells: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// A parsed workbook, the unit of import
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub sheets: Vec<Sheet>,
}

impl Book {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn require_sheet(&self, name: &'static str) -> Result<&Sheet> {
        self.sheet(name).ok_or(Error::MissingSheet { sheet: name })
    }
}

/// Read an uploaded workbook into string rows
pub fn read_workbook(path: &Path) -> Result<Book> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| Error::Workbook(format!("failed to open {}: {e}", path.display())))?;

    let mut book = Book::default();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| Error::Workbook(format!("failed to read sheet {sheet_name}: {e}")))?;

        let mut rows_iter = range.rows();
        let Some(header) = rows_iter.next() else {
            book.sheets.push(Sheet {
                name: sheet_name,
                rows: Vec::new(),
            });
            continue;
        };

        let columns: Vec<Option<String>> = header.iter().map(cell_string).collect();

        let mut rows = Vec::new();
        for (index, raw) in rows_iter.enumerate() {
            let mut cells = HashMap::new();
            for (column, cell) in columns.iter().zip(raw.iter()) {
                let (Some(column), Some(value)) = (column, cell_string(cell)) else {
                    continue;
                };
                cells.insert(column.clone(), value);
            }
            if cells.is_empty() {
                continue; // blank padding row
            }
            rows.push(Row {
                index: index + 1,
                cells,
            });
        }

        book.sheets.push(Sheet {
            name: sheet_name,
            rows,
        });
    }

    Ok(book)
}

fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Some((*f as i64).to_string())
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| dt.date().format("%Y-%m-%d").to_string()),
        _ => None,
    }
}

/// One exported cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

/// One sheet of export output
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

/// Write export sheets to an xlsx file
pub fn write_workbook(path: &Path, sheets: &[SheetData]) -> Result<()> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name)
            .map_err(|e| Error::Workbook(e.to_string()))?;

        for (col, name) in sheet.columns.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *name)
                .map_err(|e| Error::Workbook(e.to_string()))?;
        }

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col_idx, cell) in row.iter().enumerate() {
                let col = col_idx as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) => {
                        worksheet
                            .write_string(row_num, col, s)
                            .map_err(|e| Error::Workbook(e.to_string()))?;
                    }
                    Cell::Int(i) => {
                        worksheet
                            .write_number(row_num, col, *i as f64)
                            .map_err(|e| Error::Workbook(e.to_string()))?;
                    }
                }
            }
        }
    }

    workbook
        .save(path)
        .map_err(|e| Error::Workbook(format!("failed to save {}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn sheet_from_rows(name: &str, columns: &[&str], rows: &[&[&str]]) -> Sheet {
    let rows = rows
        .iter()
        .enumerate()
        .map(|(index, values)| {
            let cells = columns
                .iter()
                .zip(values.iter())
                .filter(|(_, value)| !value.is_empty())
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect();
            Row {
                index: index + 1,
                cells,
            }
        })
        .collect();
    Sheet {
        name: name.to_string(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xlsx");

        let sheets = vec![SheetData {
            name: "Tandas",
            columns: &["id", "nombre", "precio"],
            rows: vec![
                vec![Cell::Int(1), Cell::text("Tanda 1"), Cell::Int(1000)],
                vec![Cell::Int(2), Cell::Empty, Cell::Int(1500)],
            ],
        }];
        write_workbook(&path, &sheets).unwrap();

        let book = read_workbook(&path).unwrap();
        let sheet = book.require_sheet("Tandas").unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("nombre"), Some("Tanda 1"));
        assert_eq!(sheet.rows[1].get("nombre"), None);
        // numbers come back as strings, integers without a trailing .0
        assert_eq!(sheet.rows[1].get("precio"), Some("1500"));
        assert_eq!(sheet.rows[1].index, 2);
    }

    #[test]
    fn missing_sheet_is_reported() {
        let book = Book::default();
        let err = book.require_sheet("Lista").unwrap_err();
        assert!(matches!(
            err,
            crate::errors::Error::MissingSheet { sheet: "Lista" }
        ));
    }

    #[test]
    fn blank_cells_read_as_absent() {
        let sheet = sheet_from_rows(
            "Lista",
            &["nombre", "notas"],
            &[&["ana", ""], &["", "x"]],
        );
        assert_eq!(sheet.rows[0].get("notas"), None);
        assert_eq!(sheet.rows[1].get("nombre"), None);
    }
}
