//! # Tenant Provisioner Library
//!
//! This library provides idempotent tenant provisioning for a BI
//! platform: find-or-create resource operations, a bounded-retry
//! policy, the provisioning and decommissioning workflows, and the
//! function handlers exposed over HTTP and the CLI.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod platform;
pub mod provisioner;
pub mod retry;
pub mod server;
pub mod telemetry;
pub mod templates;
