pub mod model;
pub mod parser;

pub use model::AuditReport;
pub use parser::parse_audit_report;
