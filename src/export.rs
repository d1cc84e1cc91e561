use crate::search::{display_record, Cell, DISPLAY_COLUMNS};
use crate::types::Facility;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use rust_xlsxwriter::{Format, Workbook};

pub const SHEET_NAME: &str = "Infrastructure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "your_infrastructure.csv",
            ExportFormat::Xlsx => "your_infrastructure.xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// Encodes `rows` with every display column, the affected-zip list included.
pub fn export(rows: &[&Facility], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(rows),
        ExportFormat::Xlsx => to_xlsx(rows),
    }
}

pub fn to_csv(rows: &[&Facility]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(DISPLAY_COLUMNS)?;
    for facility in rows {
        writer.write_record(display_record(facility).iter().map(Cell::display))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV export: {}", e.error()))
}

pub fn to_xlsx(rows: &[&Facility]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in DISPLAY_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, u16::try_from(col)?, *name, &header)?;
    }

    for (i, facility) in rows.iter().enumerate() {
        let row = u32::try_from(i + 1).context("Too many rows for a worksheet")?;
        for (col, cell) in display_record(facility).iter().enumerate() {
            let col = u16::try_from(col)?;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to encode XLSX export")
}
