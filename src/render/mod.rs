pub mod csv_export;
pub mod cursor;
pub mod document;
pub mod html;
pub mod pdf;
pub mod report;
pub mod text;

pub use csv_export::export_csv;
pub use cursor::DocumentCursor;
pub use document::Document;
pub use html::HtmlRenderer;
pub use pdf::write_pdf;
pub use report::ReportRenderer;
pub use text::{format_column_name, notes_column};
