//! CSV output of upload reports
//!
//! Reports are written as flat CSV so they can be piped into other tools:
//! one record per error message.
//!
//! All functions write to a caller-supplied writer (no file handling here)
//! for easy testing.

use std::collections::BTreeMap;
use std::io::Write;

use csv::Writer;

/// Write the row-error maps of one or more uploads
///
/// Writes columns `file,row,error`, one record per message. Files come out in
/// the given order, rows in ascending line order, and a row's messages keep
/// their order.
///
/// # Arguments
///
/// * `reports` - `(file name, file line → error messages)` pairs
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_row_errors_csv<'a, I>(reports: I, output: &mut dyn Write) -> Result<(), String>
where
    I: IntoIterator<Item = (&'a str, &'a BTreeMap<u64, Vec<String>>)>,
{
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["file", "row", "error"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (source, row_errors) in reports {
        for (row, errors) in row_errors {
            let row = row.to_string();
            for error in errors {
                writer
                    .write_record([source, row.as_str(), error.as_str()])
                    .map_err(|e| format!("Failed to write row error: {}", e))?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write the entries a feed import skipped
///
/// Writes columns `error,external_id`, one record per skipped entry, grouped
/// by error message.
pub fn write_feed_skips_csv(
    skipped: &BTreeMap<String, Vec<String>>,
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["error", "external_id"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for (error, ids) in skipped {
        for id in ids {
            writer
                .write_record([error, id])
                .map_err(|e| format!("Failed to write skipped entry: {}", e))?;
        }
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
