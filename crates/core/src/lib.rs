//! Core business rules for Opsdesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Everything that can be decided without touching the store lives here.
//!
//! # Modules
//!
//! - `auth` - Roles, route allowlists, and the password-hash-on-write guard
//! - `contact` - Contact types and counterpart eligibility
//! - `documents` - Financial document kinds and line items
//! - `reference` - Tenant-scoped reference resolution failures
//! - `validation` - Cross-field input rules
//! - `analytics` - Monthly bucketing, KPIs, and resource utilization

pub mod analytics;
pub mod auth;
pub mod contact;
pub mod documents;
pub mod reference;
pub mod validation;
