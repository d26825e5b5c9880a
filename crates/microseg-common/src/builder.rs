//! Policy Graph Builder
//!
//! Pure transformation from topology to policy objects:
//!
//! ```text
//! (TierMap, RelationshipGraph, SharedResources) ──► PolicyGraph
//!
//!   fvAp ─┬─ base fvAEPg (re-annotated)
//!         ├─ fvAEPg "App" ── fvCrtrn "default" ── fvIpAttr 0..N-1
//!         │                └ fvRsCons / fvRsProv
//!         └─ fvAEPg "Web" ...
//! ```

use crate::graph::*;
use crate::topology::{
    AddressSet, Direction, RelationshipGraph, TierMap, TierName, TierRelationships,
};
use tracing::debug;

/// Compiles topology into a [`PolicyGraph`] for one tenant/profile pair
pub struct PolicyGraphBuilder<'a> {
    tenant: &'a str,
    profile: &'a str,
    shared: &'a SharedResources,
}

impl<'a> PolicyGraphBuilder<'a> {
    pub fn new(tenant: &'a str, profile: &'a str, shared: &'a SharedResources) -> Self {
        Self {
            tenant,
            profile,
            shared,
        }
    }

    /// Build the full graph
    ///
    /// Tiers are visited in lexicographic order. A tier with no relationship
    /// entry becomes an isolated segment; relationship entries for tiers that
    /// are not in `tiers` are ignored here and reported by the validator.
    pub fn build(&self, tiers: &TierMap, relationships: &RelationshipGraph) -> PolicyGraph {
        let segments: Vec<TierSegment> = tiers
            .iter()
            .map(|(tier, addresses)| self.build_segment(tier, addresses, relationships.get(tier)))
            .collect();

        debug!(
            tenant = self.tenant,
            profile = self.profile,
            segments = segments.len(),
            "Built policy graph"
        );

        PolicyGraph {
            tenant: self.tenant.to_string(),
            profile: ApplicationProfile {
                name: self.profile.to_string(),
                description: PROFILE_DESCRIPTION.to_string(),
            },
            base: self.build_base(),
            segments,
            shared: self.shared.clone(),
        }
    }

    fn build_base(&self) -> BaseSegment {
        BaseSegment {
            name: self.shared.base_segment.clone(),
            description: BASE_SEGMENT_DESCRIPTION.to_string(),
            enforcement: Enforcement::Unenforced,
            preferred_group: PreferredGroup::Exclude,
            shutdown: false,
            bridge_domain: self.shared.bridge_domain.clone(),
            domain: DomainBinding {
                target_dn: self.shared.vmm_domain_dn.clone(),
                class_preference: ClassPreference::Useg,
            },
        }
    }

    fn build_segment(
        &self,
        tier: &TierName,
        addresses: &AddressSet,
        bindings: Option<&TierRelationships>,
    ) -> TierSegment {
        let criteria = MatchCriteria {
            name: DEFAULT_CRITERION_NAME.to_string(),
            addresses: addresses
                .iter()
                .enumerate()
                .map(|(id, address)| AddressCriterion {
                    id: id as u32,
                    address: address.to_string(),
                })
                .collect(),
        };

        let mut relationships = Vec::new();
        for (contract, directions) in bindings.into_iter().flatten() {
            for direction in [Direction::Consume, Direction::Provide] {
                if directions.contains(&direction) {
                    relationships.push(TrafficRelationship {
                        contract: contract.clone(),
                        direction,
                    });
                }
            }
        }

        TierSegment {
            name: tier.clone(),
            description: TIER_SEGMENT_DESCRIPTION.to_string(),
            enforcement: Enforcement::Unenforced,
            preferred_group: PreferredGroup::Exclude,
            attribute_based: true,
            bridge_domain: self.shared.bridge_domain.clone(),
            domain: DomainBinding {
                target_dn: self.shared.vmm_domain_dn.clone(),
                class_preference: ClassPreference::Encap,
            },
            criteria,
            relationships,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{ContractName, RawTierMap};
    use proptest::prelude::*;

    fn shared() -> SharedResources {
        SharedResources {
            bridge_domain: "outside-bd".into(),
            base_segment: "cback-epg".into(),
            vmm_domain_dn: "uni/vmmp-VMware/dom-POV".into(),
        }
    }

    fn tiers(entries: &[(&str, &[&str])]) -> TierMap {
        let raw: RawTierMap = entries
            .iter()
            .map(|(t, ips)| (t.to_string(), ips.iter().map(|s| s.to_string()).collect()))
            .collect();
        TierMap::from_raw(raw).unwrap()
    }

    fn bind(graph: &mut RelationshipGraph, tier: &str, contract: &str, direction: Direction) {
        graph.bind(
            TierName::new(tier).unwrap(),
            ContractName::new(contract).unwrap(),
            direction,
        );
    }

    #[test]
    fn test_web_app_scenario() {
        let shared = shared();
        let tiers = tiers(&[("Web", &["10.0.0.1", "10.0.0.2"]), ("App", &["10.0.1.1"])]);
        let mut rels = RelationshipGraph::default();
        bind(&mut rels, "Web", "c1", Direction::Consume);
        bind(&mut rels, "App", "c1", Direction::Provide);

        let graph = PolicyGraphBuilder::new("prod", "shop", &shared).build(&tiers, &rels);

        assert_eq!(graph.segments.len(), 2);
        assert_eq!(graph.segment_count(), 3);

        let web = graph.segment("Web").unwrap();
        assert_eq!(
            web.criteria.addresses,
            vec![
                AddressCriterion {
                    id: 0,
                    address: "10.0.0.1".into()
                },
                AddressCriterion {
                    id: 1,
                    address: "10.0.0.2".into()
                },
            ]
        );
        assert_eq!(web.relationships.len(), 1);
        assert!(web.consumes("c1"));
        assert!(!web.provides("c1"));

        let app = graph.segment("App").unwrap();
        assert_eq!(
            app.criteria.addresses,
            vec![AddressCriterion {
                id: 0,
                address: "10.0.1.1".into()
            }]
        );
        assert_eq!(app.relationships.len(), 1);
        assert!(app.provides("c1"));

        assert_eq!(graph.base.name, "cback-epg");
        assert_eq!(graph.base.description, BASE_SEGMENT_DESCRIPTION);
        assert_eq!(graph.base.enforcement, Enforcement::Unenforced);
        assert_eq!(graph.base.preferred_group, PreferredGroup::Exclude);
        assert!(!graph.base.shutdown);
        assert_eq!(graph.base.domain.class_preference, ClassPreference::Useg);
    }

    #[test]
    fn test_segments_sorted_by_tier_name() {
        let shared = shared();
        let tiers = tiers(&[("web", &[]), ("db", &[]), ("app", &[])]);
        let graph = PolicyGraphBuilder::new("t", "p", &shared)
            .build(&tiers, &RelationshipGraph::default());

        let names: Vec<_> = graph.segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["app", "db", "web"]);
    }

    #[test]
    fn test_empty_tier_builds_isolated_segment() {
        let shared = shared();
        let tiers = tiers(&[("Orphan", &[])]);
        let graph = PolicyGraphBuilder::new("t", "p", &shared)
            .build(&tiers, &RelationshipGraph::default());

        let orphan = graph.segment("Orphan").unwrap();
        assert!(orphan.criteria.addresses.is_empty());
        assert!(orphan.relationships.is_empty());
        assert_eq!(orphan.criteria.name, DEFAULT_CRITERION_NAME);
    }

    #[test]
    fn test_consume_and_provide_same_contract() {
        let shared = shared();
        let tiers = tiers(&[("Mid", &["10.1.1.1"])]);
        let mut rels = RelationshipGraph::default();
        bind(&mut rels, "Mid", "chain", Direction::Provide);
        bind(&mut rels, "Mid", "chain", Direction::Consume);

        let graph = PolicyGraphBuilder::new("t", "p", &shared).build(&tiers, &rels);
        let mid = graph.segment("Mid").unwrap();
        assert_eq!(mid.relationships.len(), 2);
        assert!(mid.consumes("chain"));
        assert!(mid.provides("chain"));
    }

    #[test]
    fn test_segments_bound_to_shared_resources() {
        let shared = shared();
        let tiers = tiers(&[("Web", &["10.0.0.1"])]);
        let graph = PolicyGraphBuilder::new("t", "p", &shared)
            .build(&tiers, &RelationshipGraph::default());

        let web = graph.segment("Web").unwrap();
        assert!(web.attribute_based);
        assert_eq!(web.enforcement, Enforcement::Unenforced);
        assert_eq!(web.preferred_group, PreferredGroup::Exclude);
        assert_eq!(web.bridge_domain, "outside-bd");
        assert_eq!(web.domain.target_dn, "uni/vmmp-VMware/dom-POV");
        assert_eq!(web.domain.class_preference, ClassPreference::Encap);
        assert_eq!(graph.profile.description, PROFILE_DESCRIPTION);
    }

    #[test]
    fn test_relationships_for_unknown_tiers_are_ignored() {
        let shared = shared();
        let tiers = tiers(&[("Web", &["10.0.0.1"])]);
        let mut rels = RelationshipGraph::default();
        bind(&mut rels, "Ghost", "c9", Direction::Provide);

        let graph = PolicyGraphBuilder::new("t", "p", &shared).build(&tiers, &rels);
        assert_eq!(graph.segments.len(), 1);
        assert!(graph.segment("Web").unwrap().relationships.is_empty());
    }

    fn arb_raw_tiers() -> impl Strategy<Value = RawTierMap> {
        prop::collection::btree_map(
            "[a-z]{1,8}",
            prop::collection::vec(any::<[u8; 4]>(), 0..12).prop_map(|octets| {
                octets
                    .into_iter()
                    .map(|o| format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3]))
                    .collect::<Vec<_>>()
            }),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_build_is_deterministic(raw in arb_raw_tiers()) {
            let shared = shared();
            let tiers = TierMap::from_raw(raw).unwrap();
            let mut rels = RelationshipGraph::default();
            for (i, (tier, _)) in tiers.iter().enumerate() {
                let direction = if i % 2 == 0 { Direction::Consume } else { Direction::Provide };
                rels.bind(tier.clone(), ContractName::new("shared").unwrap(), direction);
            }

            let builder = PolicyGraphBuilder::new("t", "p", &shared);
            prop_assert_eq!(builder.build(&tiers, &rels), builder.build(&tiers, &rels));
        }

        #[test]
        fn prop_criterion_ids_are_dense(raw in arb_raw_tiers()) {
            let shared = shared();
            let tiers = TierMap::from_raw(raw).unwrap();
            let graph = PolicyGraphBuilder::new("t", "p", &shared)
                .build(&tiers, &RelationshipGraph::default());

            prop_assert_eq!(graph.segments.len(), tiers.len());
            for segment in &graph.segments {
                let expected = tiers.get(&segment.name).unwrap();
                let ids: Vec<u32> = segment.criteria.addresses.iter().map(|c| c.id).collect();
                let dense: Vec<u32> = (0..expected.len() as u32).collect();
                prop_assert_eq!(ids, dense);

                let addresses: Vec<&str> =
                    segment.criteria.addresses.iter().map(|c| c.address.as_str()).collect();
                prop_assert_eq!(addresses, expected.iter().collect::<Vec<_>>());
            }
        }
    }
}
