//! # Domain Module
//!
//! Business logic for partner commission tracking and the monthly closing
//! engine. Everything here is storage-agnostic (services are generic over a
//! storage `Connection`) and UI-agnostic: the REST layer maps public DTOs to
//! the command types consumed by these services.
//!
//! ## Module Organization
//!
//! - **commission_service**: effective-dated rule resolution and commission
//!   calculation
//! - **bonus_service**: bonus policy evaluation (client-count and revenue
//!   axes, stacking) plus the flat per-client volume bonus
//! - **closing_service**: the monthly closing lifecycle — detail
//!   computation, aggregation, run/complete/reopen state machine
//! - **audit_service**: append-only audit recording that never fails the
//!   triggering operation
//! - **export_service**: CSV rendering of closing results
//! - **models**: domain entities (partners, clients, rules, policies,
//!   closings, audit entries)
//! - **commands**: internal command/result structs per service operation
//! - **errors**: the engine's tagged error taxonomy

pub mod audit_service;
pub mod bonus_service;
pub mod closing_service;
pub mod commands;
pub mod commission_service;
pub mod errors;
pub mod export_service;
pub mod models;

pub use audit_service::AuditService;
pub use bonus_service::BonusService;
pub use closing_service::ClosingService;
pub use commission_service::CommissionService;
pub use errors::EngineError;
pub use export_service::ExportService;
