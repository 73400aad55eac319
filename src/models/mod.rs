pub mod audit;
pub mod mismatch;
pub mod schema;
pub mod session;
pub mod value;

pub use audit::{
    ContractAuditRecord, ContractMetadata, RawContractMetadata, RawReceiptRecord, ReceiptAudit,
    ReceiptAuditRecord,
};
pub use mismatch::{MismatchEntry, RawMismatch, ZeroOverpayPolicy, CONTAINER_COUNT_KEY};
pub use schema::{DataField, DocumentKind, ExtractedRecord, SchemaField};
pub use session::Session;
