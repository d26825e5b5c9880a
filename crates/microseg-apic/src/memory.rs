//! In-memory fabric controller (for testing and dry runs against fixtures)

use crate::controller::{ClassQuery, ConfigRequest, FabricController};
use crate::mo::{profile_dn, tenant_dn, ManagedObject};
use async_trait::async_trait;
use microseg_common::{MicrosegError, Result};
use parking_lot::RwLock;

/// Controller that keeps a flat object list and records every call
pub struct InMemoryFabric {
    objects: RwLock<Vec<ManagedObject>>,
    queries: RwLock<Vec<ClassQuery>>,
    commits: RwLock<Vec<ConfigRequest>>,
    rejection: RwLock<Option<(String, String)>>,
}

impl InMemoryFabric {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            queries: RwLock::new(Vec::new()),
            commits: RwLock::new(Vec::new()),
            rejection: RwLock::new(None),
        }
    }

    pub fn add_tenant(&self, tenant: &str) {
        self.objects.write().push(
            ManagedObject::new("fvTenant")
                .attr("name", tenant)
                .attr("dn", tenant_dn(tenant)),
        );
    }

    pub fn add_profile(&self, tenant: &str, profile: &str) {
        self.objects.write().push(
            ManagedObject::new("fvAp")
                .attr("name", profile)
                .attr("dn", profile_dn(tenant, profile)),
        );
    }

    /// Add an EPG with its bridge-domain and domain bindings
    pub fn add_epg(
        &self,
        tenant: &str,
        profile: &str,
        name: &str,
        attribute_based: bool,
        bridge_domain: Option<&str>,
        domains: &[&str],
    ) {
        let mut epg = ManagedObject::new("fvAEPg")
            .attr("name", name)
            .attr("dn", format!("{}/epg-{}", profile_dn(tenant, profile), name))
            .attr("isAttrBasedEPg", if attribute_based { "yes" } else { "no" });
        if let Some(bd) = bridge_domain {
            epg = epg.child(ManagedObject::new("fvRsBd").attr("tnFvBDName", bd));
        }
        for dom in domains {
            epg = epg.child(ManagedObject::new("fvRsDomAtt").attr("tDn", *dom));
        }
        self.objects.write().push(epg);
    }

    /// Make every following commit fail with `CommitRejected`
    pub fn reject_commits(&self, code: &str, text: &str) {
        *self.rejection.write() = Some((code.to_string(), text.to_string()));
    }

    pub fn commits(&self) -> Vec<ConfigRequest> {
        self.commits.read().clone()
    }

    pub fn queries(&self) -> Vec<ClassQuery> {
        self.queries.read().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.read().len()
    }
}

impl Default for InMemoryFabric {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FabricController for InMemoryFabric {
    async fn query(&self, query: &ClassQuery) -> Result<Vec<ManagedObject>> {
        self.queries.write().push(query.clone());

        let scope = query.scope.as_ref().map(|dn| format!("{}/", dn));
        let found = self
            .objects
            .read()
            .iter()
            .filter(|mo| mo.class == query.class)
            .filter(|mo| match &scope {
                Some(prefix) => mo.get("dn").is_some_and(|dn| dn.starts_with(prefix.as_str())),
                None => true,
            })
            .filter(|mo| query.filter.as_ref().map_or(true, |f| f.matches(mo)))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn commit(&self, request: &ConfigRequest) -> Result<()> {
        if let Some((code, text)) = self.rejection.read().clone() {
            return Err(MicrosegError::CommitRejected { code, text });
        }
        self.commits.write().push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scoped_query() {
        let fabric = InMemoryFabric::new();
        fabric.add_epg("a", "p", "e1", false, None, &[]);
        fabric.add_epg("b", "p", "e2", false, None, &[]);

        let found = fabric
            .query(&ClassQuery::new("fvAEPg").under("uni/tn-a/ap-p"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some("e1"));
        assert_eq!(fabric.query_count(), 1);
    }

    #[tokio::test]
    async fn test_rejection_leaves_no_commit() {
        let fabric = InMemoryFabric::new();
        fabric.reject_commits("1", "nope");
        assert!(fabric.commit(&ConfigRequest::default()).await.is_err());
        assert!(fabric.commits().is_empty());
    }
}
