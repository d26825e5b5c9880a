//! Identity Resolver
//!
//! Finds the fabric resources every generated segment shares: the bridge
//! domain, the base (catch-all) segment and the VMM domain. Explicit overrides
//! win; anything left open is read from the profile's existing EPGs.

use crate::controller::{ClassQuery, FabricController};
use crate::mo::{profile_dn, ManagedObject};
use microseg_common::{MicrosegError, Result, SharedResources};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Prefix of VMM domain DNs
const VMM_DOMAIN_PREFIX: &str = "uni/vmmp-";

/// Operator-supplied values that skip controller discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedResourceOverrides {
    pub bridge_domain: Option<String>,
    pub base_segment: Option<String>,
    pub vmm_domain_dn: Option<String>,
}

impl SharedResourceOverrides {
    fn complete(&self) -> Option<SharedResources> {
        Some(SharedResources {
            bridge_domain: self.bridge_domain.clone()?,
            base_segment: self.base_segment.clone()?,
            vmm_domain_dn: self.vmm_domain_dn.clone()?,
        })
    }
}

/// Resolves shared resources for a tenant/profile pair
pub struct IdentityResolver<'a, C: FabricController + ?Sized> {
    controller: &'a C,
    overrides: &'a SharedResourceOverrides,
}

impl<'a, C: FabricController + ?Sized> IdentityResolver<'a, C> {
    pub fn new(controller: &'a C, overrides: &'a SharedResourceOverrides) -> Self {
        Self {
            controller,
            overrides,
        }
    }

    /// Resolve, or fail with `Unresolved`
    pub async fn resolve(&self, tenant: &str, profile: &str) -> Result<SharedResources> {
        if let Some(shared) = self.overrides.complete() {
            debug!("Shared resources fully configured, skipping discovery");
            return Ok(shared);
        }

        let dn = profile_dn(tenant, profile);
        let epgs = self
            .controller
            .query(
                &ClassQuery::new("fvAEPg")
                    .under(dn.clone())
                    .with_children(&["fvRsBd", "fvRsDomAtt"]),
            )
            .await?;

        let base = self.pick_base(&dn, &epgs)?;
        let base_name = base.get("name").unwrap_or_default().to_string();

        let bridge_domain = match &self.overrides.bridge_domain {
            Some(bd) => bd.clone(),
            None => base
                .children_of("fvRsBd")
                .find_map(|rs| rs.get("tnFvBDName"))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    MicrosegError::Unresolved(format!("base EPG {base_name} has no bridge domain"))
                })?,
        };

        let vmm_domain_dn = match &self.overrides.vmm_domain_dn {
            Some(dom) => dom.clone(),
            None => base
                .children_of("fvRsDomAtt")
                .filter_map(|rs| rs.get("tDn"))
                .find(|dn| dn.starts_with(VMM_DOMAIN_PREFIX))
                .map(str::to_string)
                .ok_or_else(|| {
                    MicrosegError::Unresolved(format!(
                        "base EPG {base_name} is not attached to a VMM domain"
                    ))
                })?,
        };

        let shared = SharedResources {
            bridge_domain,
            base_segment: base_name,
            vmm_domain_dn,
        };
        info!(
            bridge_domain = %shared.bridge_domain,
            base_segment = %shared.base_segment,
            vmm_domain = %shared.vmm_domain_dn,
            "Resolved shared resources"
        );
        Ok(shared)
    }

    fn pick_base<'m>(&self, dn: &str, epgs: &'m [ManagedObject]) -> Result<&'m ManagedObject> {
        if let Some(name) = &self.overrides.base_segment {
            return epgs
                .iter()
                .find(|epg| epg.get("name") == Some(name.as_str()))
                .ok_or_else(|| {
                    MicrosegError::Unresolved(format!("base EPG {name} not found under {dn}"))
                });
        }

        let candidates: Vec<&ManagedObject> = epgs
            .iter()
            .filter(|epg| epg.get("isAttrBasedEPg") != Some("yes"))
            .collect();

        match candidates.as_slice() {
            [only] => Ok(*only),
            [] => Err(MicrosegError::Unresolved(format!("no base EPG under {dn}"))),
            many => {
                let names: Vec<&str> = many.iter().filter_map(|e| e.get("name")).collect();
                Err(MicrosegError::Unresolved(format!(
                    "several candidate base EPGs under {dn} ({}); configure base_segment",
                    names.join(", ")
                )))
            }
        }
    }
}
