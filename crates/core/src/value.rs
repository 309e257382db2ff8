// Cell and condition value normalization.
//
// Rows and condition values are compared as strings, so every producer
// (workbook reader, CSV reader, config parser) must agree on how a number
// or boolean is spelled.

/// Spell a float the way the workbook reader does: integers without decimals.
pub fn normalize_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn normalize_int(n: i64) -> String {
    n.to_string()
}

/// Booleans are stored as TRUE/FALSE text.
pub fn normalize_bool(b: bool) -> String {
    if b { "TRUE" } else { "FALSE" }.to_string()
}
