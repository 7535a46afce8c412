use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};

use super::{Cell, ParsedSheet, Record, SheetError};

/// Key given to columns whose header cell is blank.
const BLANK_HEADER: &str = "__EMPTY";

/// Decodes the first worksheet into a header row plus positional data rows.
///
/// Fails with [`SheetError::Empty`] when the sheet has no rows at all. A sheet
/// holding only a header row parses to zero data rows.
pub fn parse(bytes: &[u8]) -> Result<ParsedSheet, SheetError> {
    let mut rows = first_sheet_rows(bytes)?.into_iter();
    let header = rows.next().ok_or(SheetError::Empty)?;
    let rows: Vec<Vec<Cell>> = rows.filter(|row| !row.is_empty()).collect();

    let width = rows
        .iter()
        .map(Vec::len)
        .fold(header.len(), usize::max);

    Ok(ParsedSheet {
        headers: header_keys(&header, width),
        rows,
    })
}

/// Decodes the first worksheet into header-keyed records.
///
/// Fails with [`SheetError::Empty`] when there is no data row to project.
pub fn parse_as_records(bytes: &[u8]) -> Result<Vec<Record>, SheetError> {
    let sheet = parse(bytes)?;
    let records: Vec<Record> = sheet
        .rows
        .iter()
        .map(|row| {
            sheet
                .headers
                .iter()
                .zip(row)
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(key, cell)| (key.clone(), cell.clone()))
                .collect::<Record>()
        })
        .filter(|record| !record.is_empty())
        .collect();

    if records.is_empty() {
        return Err(SheetError::Empty);
    }
    Ok(records)
}

fn first_sheet_rows(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(SheetError::Empty),
    };

    Ok(range
        .rows()
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(Cell::from).collect();
            while cells.last().is_some_and(Cell::is_empty) {
                cells.pop();
            }
            cells
        })
        .collect())
}

/// Turns the header row into unique column keys: blank headers become
/// `__EMPTY` and repeats get the first free `_1`, `_2`, ... suffix.
fn header_keys(header: &[Cell], width: usize) -> Vec<String> {
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    (0..width)
        .map(|i| {
            let base = match header.get(i) {
                None | Some(Cell::Empty) => BLANK_HEADER.to_string(),
                Some(cell) => cell.to_string(),
            };
            let mut key = base.clone();
            if used.contains(&key) {
                let n = next_suffix.entry(base.clone()).or_insert(1);
                loop {
                    key = format!("{base}_{n}");
                    *n += 1;
                    if !used.contains(&key) {
                        break;
                    }
                }
            }
            used.insert(key.clone());
            key
        })
        .collect()
}
