//! Credflow Types - Canonical domain types for credential-issuance orchestration
//!
//! This crate contains the foundational types for credflow with zero
//! dependencies on other credflow crates:
//!
//! - The exchange record (one per subject-credential lifecycle) and its
//!   closed protocol state enum
//! - Webhook event payloads as the Issuer Agent delivers them (v1 and v2
//!   field spellings both accepted)
//! - Webhook topic classification
//!
//! # Architectural Invariants
//!
//! 1. A record's `state` is the single source of truth for where a subject
//!    is in the protocol; transitions only move forward
//! 2. `connection_id` is assigned once at record creation and never changes
//! 3. Records are superseded, never deleted — they are the audit trail
//! 4. Every mutation bumps `version`; stores reject stale writes

pub mod event;
pub mod record;
pub mod topic;

pub use event::*;
pub use record::*;
pub use topic::*;
