use std::io::Cursor;

use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};

use crate::application::ports::DocumentExtractionError;

use super::{FormatExtractor, PAGE_BREAK};

/// Each sheet becomes a `# Sheet: <name>` header followed by tab-separated
/// rows. Sheets are separated by a form feed and counted as pages.
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty cells render as empty fields, so a blank row inside the used range
/// stays as a line of tabs.
fn render_row(cells: &[Data]) -> String {
    let rendered: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
    rendered.join("\t")
}

impl FormatExtractor for XlsxExtractor {
    fn extract_bytes(&self, data: &[u8]) -> Result<(String, Option<i32>), DocumentExtractionError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
            .map_err(|e: calamine::XlsxError| DocumentExtractionError::CorruptDocument(e.to_string()))?;

        let names = workbook.sheet_names();
        if names.is_empty() {
            return Err(DocumentExtractionError::CorruptDocument(
                "workbook declares no sheets".to_string(),
            ));
        }
        let mut sheets = Vec::with_capacity(names.len());

        for name in &names {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| DocumentExtractionError::CorruptDocument(e.to_string()))?;

            let mut sheet = format!("# Sheet: {}", name);
            for row in range.rows().map(render_row) {
                sheet.push('\n');
                sheet.push_str(&row);
            }
            sheets.push(sheet);
        }

        Ok((sheets.join(&PAGE_BREAK.to_string()), Some(names.len() as i32)))
    }
}
