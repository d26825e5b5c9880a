//! Pre-flight existence checks
//!
//! Both checks run before anything is built, so no graph is ever assembled
//! against a parent that does not exist.

use crate::controller::{ClassQuery, FabricController};
use crate::mo::profile_dn;
use microseg_common::{MicrosegError, ResourceKind, Result};
use tracing::debug;

/// Fail with `NotFound` unless tenant `tenant` exists
pub async fn check_tenant<C: FabricController + ?Sized>(
    controller: &C,
    tenant: &str,
) -> Result<()> {
    let found = controller
        .query(&ClassQuery::new("fvTenant").eq("name", tenant))
        .await?;
    if found.is_empty() {
        return Err(MicrosegError::not_found(ResourceKind::Tenant, tenant));
    }
    debug!(tenant, "Tenant exists");
    Ok(())
}

/// Fail with `NotFound` unless `profile` exists under `tenant`
///
/// Matches on the profile DN so a same-named profile in another tenant does
/// not count.
pub async fn check_profile<C: FabricController + ?Sized>(
    controller: &C,
    tenant: &str,
    profile: &str,
) -> Result<()> {
    let found = controller
        .query(&ClassQuery::new("fvAp").eq("dn", profile_dn(tenant, profile)))
        .await?;
    if found.is_empty() {
        return Err(MicrosegError::not_found(ResourceKind::ApplicationProfile, profile));
    }
    debug!(tenant, profile, "Application profile exists");
    Ok(())
}

/// Run both checks, tenant first
pub async fn preflight<C: FabricController + ?Sized>(
    controller: &C,
    tenant: &str,
    profile: &str,
) -> Result<()> {
    check_tenant(controller, tenant).await?;
    check_profile(controller, tenant, profile).await
}
