//! 表格导出（CSV / XLSX）

use actix_web::{HttpResponse, Result as ActixResult};
use rust_xlsxwriter::{Format, Workbook};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// 未指定或无法识别时导出 CSV
    pub fn parse(format: Option<&str>) -> Self {
        match format.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("xlsx") => ExportFormat::Xlsx,
            _ => ExportFormat::Csv,
        }
    }
}

/// 一张待导出的表，所有单元格按字符串写出
pub struct ExportTable {
    pub file_stem: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn into_response(self, format: ExportFormat) -> ActixResult<HttpResponse> {
        match format {
            ExportFormat::Csv => {
                let data = self.to_csv().map_err(|e| {
                    error!("CSV 生成失败: {}", e);
                    actix_web::error::ErrorInternalServerError(format!("CSV generation failed: {e}"))
                })?;
                Ok(HttpResponse::Ok()
                    .content_type("text/csv; charset=utf-8")
                    .insert_header((
                        "Content-Disposition",
                        format!("attachment; filename=\"{}.csv\"", self.file_stem),
                    ))
                    .body(data))
            }
            ExportFormat::Xlsx => {
                let data = self.to_xlsx().map_err(|e| {
                    error!("XLSX 生成失败: {}", e);
                    actix_web::error::ErrorInternalServerError(format!("XLSX generation failed: {e}"))
                })?;
                Ok(HttpResponse::Ok()
                    .content_type(
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    )
                    .insert_header((
                        "Content-Disposition",
                        format!("attachment; filename=\"{}.xlsx\"", self.file_stem),
                    ))
                    .body(data))
            }
        }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(self.headers).map_err(|e| e.to_string())?;
        for row in &self.rows {
            wtr.write_record(row).map_err(|e| e.to_string())?;
        }
        wtr.into_inner().map_err(|e| e.to_string())
    }

    pub fn to_xlsx(&self) -> Result<Vec<u8>, String> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let header_format = Format::new().set_bold();

        for (col, header) in self.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(|e| e.to_string())?;
        }
        for (row, values) in self.rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                worksheet
                    .write_string((row + 1) as u32, col as u16, value)
                    .map_err(|e| e.to_string())?;
            }
        }

        workbook.save_to_buffer().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ExportTable {
        ExportTable {
            file_stem: "students",
            headers: &["usn", "name"],
            rows: vec![
                vec!["4KT21CS001".to_string(), "Asha".to_string()],
                vec!["4KT21CS002".to_string(), "Rao, B".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = String::from_utf8(table().to_csv().unwrap()).unwrap();
        assert_eq!(csv, "usn,name\n4KT21CS001,Asha\n4KT21CS002,\"Rao, B\"\n");
    }

    #[test]
    fn test_xlsx_is_a_zip_container() {
        let bytes = table().to_xlsx().unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse(Some("XLSX")), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse(Some("pdf")), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(None), ExportFormat::Csv);
    }
}
