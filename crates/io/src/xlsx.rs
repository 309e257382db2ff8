// Tabular source reader: Excel/ODS workbooks through calamine, CSV/TSV
// through the csv module. Every cell comes out as a string.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::NaiveDateTime;
use tagtrend_core::value::{normalize_bool, normalize_float, normalize_int};
use tagtrend_core::{SheetData, SheetSource, SourceError};

enum Backing {
    Workbook(Sheets<BufReader<File>>),
    /// A delimited file is a table with a single sheet named after the file.
    Delimited { sheet: String, data: SheetData },
}

/// A spreadsheet file opened for reading (xlsx, xlsm, xls, xlsb, ods, csv, tsv).
pub struct WorkbookSource {
    path: PathBuf,
    table_id: String,
    backing: Backing,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let locator = path.display().to_string();
        let table_id = table_id_for(path);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let backing = match ext.as_str() {
            "csv" | "tsv" | "txt" => {
                let data = if ext == "tsv" {
                    crate::csv::import_tsv(path)
                } else {
                    crate::csv::import(path)
                }
                .map_err(|message| SourceError::Open { locator: locator.clone(), message })?;
                Backing::Delimited { sheet: table_id.clone(), data }
            }
            _ => {
                let workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| SourceError::Open {
                    locator: locator.clone(),
                    message: e.to_string(),
                })?;
                if workbook.sheet_names().is_empty() {
                    return Err(SourceError::Empty(locator));
                }
                Backing::Workbook(workbook)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            table_id,
            backing,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetSource for WorkbookSource {
    fn table_id(&self) -> &str {
        &self.table_id
    }

    fn sheet_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(match &self.backing {
            Backing::Workbook(workbook) => workbook.sheet_names(),
            Backing::Delimited { sheet, .. } => vec![sheet.clone()],
        })
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, SourceError> {
        let available = self.sheet_names()?;
        if !available.iter().any(|n| n == sheet) {
            return Err(SourceError::UnknownSheet { sheet: sheet.to_string(), available });
        }

        match &mut self.backing {
            Backing::Workbook(workbook) => {
                let range = workbook.worksheet_range(sheet).map_err(|e| SourceError::Read {
                    sheet: sheet.to_string(),
                    message: e.to_string(),
                })?;
                Ok(range_to_sheet(&range))
            }
            Backing::Delimited { data, .. } => Ok(data.clone()),
        }
    }
}

/// Table identifier for a source path: the file stem (`data/orders.xlsx` -> `orders`).
pub fn table_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string())
}

/// First row of the used range is the header; rows with no content are dropped.
fn range_to_sheet(range: &Range<Data>) -> SheetData {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return SheetData::default();
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_to_string(cell);
            if name.is_empty() {
                format!("Unnamed: {i}")
            } else {
                name
            }
        })
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    SheetData::new(columns, rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => normalize_float(*n),
        Data::Int(n) => normalize_int(*n),
        Data::Bool(b) => normalize_bool(*b),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return normalize_float(dt.as_f64());
            }
            match dt.as_datetime() {
                Some(ts) => format_datetime(ts),
                None => normalize_float(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Date-only values print as `YYYY-MM-DD`, others with the time of day.
fn format_datetime(ts: NaiveDateTime) -> String {
    if ts.time() == chrono::NaiveTime::MIN {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
