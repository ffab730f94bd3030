use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Workbook error: {0}")]
    XlsxError(#[from] calamine::XlsxError),
    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),
    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),
}
