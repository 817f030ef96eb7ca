//! Idempotent resource operations and workflow orchestration.
//!
//! Every operation follows the same find-or-create protocol: query the
//! remote platform for an entity matching a deterministic key, reuse it
//! when found, create it otherwise, and fail when a create "succeeds"
//! without returning a usable identifier. The platform is the only
//! source of truth; nothing is cached or persisted locally, so repeated
//! invocations converge instead of duplicating work.
//!
//! Each operation is wrapped in the bounded retry policy from
//! [`crate::retry`]; retries are in-process and do not coordinate with
//! other concurrent invocations.

use std::sync::Arc;

use crate::platform::PlatformApi;
use crate::retry::RetryPolicy;

mod connections;
mod dashboards;
mod folders;
mod groups;
mod lookml;
mod saml;
mod users;
mod workflow;

pub use connections::{ConnectionSummary, ConnectionTestOutcome};
pub use dashboards::ScheduledDeliverySpec;
pub use folders::{archived_folder_name, project_folder_name};
pub use lookml::ValidationOutcome;
pub use users::BulkUserSpec;

/// Orchestrates remote admin-API operations for complete tenant
/// lifecycle management. Constructed once at startup and shared across
/// invocations; holds no mutable state of its own.
pub struct Provisioner {
    platform: Arc<dyn PlatformApi>,
    retry: RetryPolicy,
}

impl Provisioner {
    pub fn new(platform: Arc<dyn PlatformApi>, retry: RetryPolicy) -> Self {
        Self { platform, retry }
    }
}
