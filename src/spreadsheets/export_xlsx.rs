use crate::domain::{AnalysisRecord, Cell, RECORD_COLUMNS};
use crate::errors::ServerError;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

fn build_workbook(records: &[AnalysisRecord]) -> Result<Workbook, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Deals")
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {e}")))?;

    let bold = Format::new().set_bold();
    for (col, header) in RECORD_COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(|e| {
                ServerError::XlsxError(format!("Failed to write header '{header}': {e}"))
            })?;
    }

    for (i, record) in records.iter().enumerate() {
        write_row(worksheet, (i + 1) as u32, record)?;
    }

    Ok(workbook)
}

fn write_row(sheet: &mut Worksheet, row: u32, record: &AnalysisRecord) -> Result<(), ServerError> {
    for (col, cell) in record.cells().into_iter().enumerate() {
        let col = col as u16;
        let written = match cell {
            Cell::Text(s) => sheet.write_string(row, col, s).map(|_| ()),
            Cell::Number(n) => sheet.write_number(row, col, n).map(|_| ()),
            Cell::Empty => Ok(()),
        };
        written.map_err(|e| {
            ServerError::XlsxError(format!(
                "Failed to write {} for {}: {e}",
                RECORD_COLUMNS[col as usize], record.record_id
            ))
        })?;
    }
    Ok(())
}

pub fn export_records_xlsx(records: &[AnalysisRecord]) -> Result<Vec<u8>, ServerError> {
    build_workbook(records)?
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}

pub fn write_records_xlsx(records: &[AnalysisRecord], path: &Path) -> Result<(), ServerError> {
    build_workbook(records)?
        .save(path)
        .map_err(|e| ServerError::XlsxError(format!("Failed to save {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CancelFlag, MemoryHistory};
    use crate::tests::utils::{offline_pipeline, sample_listings};

    #[test]
    fn writes_workbook_to_disk() {
        let out = offline_pipeline(1).run(
            &sample_listings(),
            &MemoryHistory::new(),
            "Atlanta, GA",
            &CancelFlag::new(),
        );
        let records: Vec<AnalysisRecord> = out.records().cloned().collect();
        let path = std::env::temp_dir().join(format!("deals_{}.xlsx", std::process::id()));

        write_records_xlsx(&records, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_export_still_has_header() {
        let bytes = export_records_xlsx(&[]).unwrap();
        assert!(bytes.len() > 100);
    }
}
