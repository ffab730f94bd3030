pub mod cell_ref;
pub mod hyperlinks;
pub mod workbook;
