//! Storage layer: abstraction traits plus the CSV-file-backed
//! implementation used in production and tests.

pub mod csv;
pub mod traits;

pub use traits::{
    AuditStorage, BonusPolicyStorage, ClientStorage, ClosingStorage, CommissionRuleStorage,
    Connection, PartnerStorage,
};
