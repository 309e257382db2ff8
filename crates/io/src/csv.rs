// CSV/TSV import/export of header + string rows

use std::io::Read;
use std::path::Path;

use tagtrend_core::SheetData;

/// Import a delimited file; the delimiter is sniffed from the content.
pub fn import(path: &Path) -> Result<SheetData, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<SheetData, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, b'\t')
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<SheetData, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Consistent lines weighted by field count; more columns breaks ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// First record is the header. Blank lines are skipped by the reader.
fn import_from_string(content: &str, delimiter: u8) -> Result<SheetData, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(SheetData::new(columns, rows))
}

/// Encode `data` as comma-separated text: header, then one record per row,
/// each padded or truncated to the header width.
pub fn export_to_bytes(data: &SheetData) -> Result<Vec<u8>, String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    // A sheet without columns has nothing to say; an empty file reads back the same.
    if !data.columns.is_empty() {
        writer.write_record(&data.columns).map_err(|e| e.to_string())?;
        let width = data.columns.len();
        for row in &data.rows {
            let record = (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
            writer.write_record(record).map_err(|e| e.to_string())?;
        }
    }

    writer.into_inner().map_err(|e| e.to_string())
}
