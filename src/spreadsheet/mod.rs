//! Spreadsheet decoding.
//!
//! Only the first worksheet of a workbook is read. Two projections are offered:
//! [`parse`] keeps rows positional (used for upload previews) and
//! [`parse_as_records`] keys every cell by its column header (used when building
//! analyses).

mod cell;
mod parser;

pub use cell::Cell;
pub use parser::{parse, parse_as_records};

use std::collections::HashMap;

use anyhow::Context;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// One data row keyed by column header. Blank cells are absent.
pub type Record = HashMap<String, Cell>;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("spreadsheet has no rows")]
    Empty,
    #[error(transparent)]
    Unreadable(#[from] calamine::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ParsedSheet {
    pub fn preview(&self, limit: usize) -> &[Vec<Cell>] {
        &self.rows[..self.rows.len().min(limit)]
    }
}

/// Runs a decoder on the blocking pool so workbook decoding does not stall the
/// async workers.
pub async fn decode_blocking<T, F>(bytes: Bytes, decode: F) -> anyhow::Result<Result<T, SheetError>>
where
    T: Send + 'static,
    F: FnOnce(&[u8]) -> Result<T, SheetError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .context("spreadsheet decode task")
}
