pub mod aggregator;
pub mod classifier;
pub mod field_editor;
pub mod report;

pub use aggregator::{AuditSummary, QuantityParsePolicy, ReceiptSummary};
pub use classifier::{classify, Classified};
pub use field_editor::{FieldEditor, FieldRow, FieldUpdatePayload};
pub use report::AuditReportService;
