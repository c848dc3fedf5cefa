//! CSV export of batch prediction results

use crate::types::table::Table;
use anyhow::{Context, Result};
use tracing::debug;

/// Serializes result tables into the downloadable CSV file
#[derive(Debug, Clone)]
pub struct ResultExporter {
    file_name: String,
}

impl ResultExporter {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
        }
    }

    /// UTF-8 CSV: header row, then one line per table row, no index column
    pub fn to_csv(&self, table: &Table) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(table.columns())
            .context("Failed to write CSV header")?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .context("Failed to write CSV row")?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;

        debug!(
            file = %self.file_name,
            rows = table.row_count(),
            bytes = bytes.len(),
            "Exported prediction CSV"
        );
        Ok(bytes)
    }

    /// Download file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `Content-Disposition` header value for the download
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .file_name
            .chars()
            .filter(|c| !matches!(c, '"' | '\\' | '\r' | '\n'))
            .collect();
        format!("attachment; filename=\"{}\"", safe)
    }
}
