//! Wire encoding of a policy graph
//!
//! ```text
//! polUni
//! └─ fvTenant
//!    └─ fvAp
//!       ├─ fvAEPg (base)   ── fvRsDomAtt ── vmmSecP, fvRsBd
//!       └─ fvAEPg (tier)   ── fvRsDomAtt, fvRsCustQosPol, fvRsBd,
//!                             fvCrtrn ── fvIpAttr*, fvRsCons*, fvRsProv*
//! ```

use crate::controller::ConfigRequest;
use crate::mo::ManagedObject;
use microseg_common::{
    BaseSegment, Direction, DomainBinding, PolicyGraph, TierSegment, TrafficRelationship,
};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn domain_attachment(binding: &DomainBinding) -> ManagedObject {
    ManagedObject::new("fvRsDomAtt")
        .attr("tDn", &binding.target_dn)
        .attr("classPref", binding.class_preference.as_str())
        .attr("bindingType", "none")
        .attr("encap", "unknown")
        .attr("encapMode", "auto")
        .attr("instrImedcy", "immediate")
        .attr("resImedcy", "immediate")
        .attr("netflowPref", "disabled")
        .attr("switchingMode", "native")
        .attr("untagged", "no")
}

fn bridge_domain(name: &str) -> ManagedObject {
    ManagedObject::new("fvRsBd").attr("tnFvBDName", name)
}

fn relationship(rel: &TrafficRelationship) -> ManagedObject {
    match rel.direction {
        Direction::Consume => ManagedObject::new("fvRsCons")
            .attr("tnVzBrCPName", rel.contract.as_str())
            .attr("intent", "install")
            .attr("prio", "unspecified"),
        Direction::Provide => ManagedObject::new("fvRsProv")
            .attr("tnVzBrCPName", rel.contract.as_str())
            .attr("intent", "install")
            .attr("matchT", "AtleastOne")
            .attr("prio", "unspecified"),
    }
}

fn encode_base(base: &BaseSegment) -> ManagedObject {
    let security = ManagedObject::new("vmmSecP")
        .attr("allowPromiscuous", "reject")
        .attr("forgedTransmits", "reject")
        .attr("macChanges", "reject");

    ManagedObject::new("fvAEPg")
        .attr("name", &base.name)
        .attr("descr", &base.description)
        .attr("pcEnfPref", base.enforcement.as_str())
        .attr("prefGrMemb", base.preferred_group.as_str())
        .attr("shutdown", yes_no(base.shutdown))
        .child(domain_attachment(&base.domain).child(security))
        .child(bridge_domain(&base.bridge_domain))
}

fn encode_segment(segment: &TierSegment) -> ManagedObject {
    let criteria = segment.criteria.addresses.iter().fold(
        ManagedObject::new("fvCrtrn")
            .attr("name", &segment.criteria.name)
            .attr("match", "any")
            .attr("prec", "0"),
        |crtrn, criterion| {
            crtrn.child(
                ManagedObject::new("fvIpAttr")
                    .attr("name", criterion.id.to_string())
                    .attr("ip", &criterion.address)
                    .attr("usefvSubnet", "no"),
            )
        },
    );

    let epg = ManagedObject::new("fvAEPg")
        .attr("name", segment.name.as_str())
        .attr("descr", &segment.description)
        .attr("isAttrBasedEPg", yes_no(segment.attribute_based))
        .attr("matchT", "AtleastOne")
        .attr("pcEnfPref", segment.enforcement.as_str())
        .attr("prefGrMemb", segment.preferred_group.as_str())
        .attr("floodOnEncap", "disabled")
        .attr("prio", "unspecified")
        .attr("shutdown", "no")
        .child(domain_attachment(&segment.domain))
        .child(ManagedObject::new("fvRsCustQosPol").attr("tnQosCustomPolName", ""))
        .child(bridge_domain(&segment.bridge_domain))
        .child(criteria);

    segment
        .relationships
        .iter()
        .fold(epg, |epg, rel| epg.child(relationship(rel)))
}

/// Encode `graph` as one configuration transaction
pub fn encode(graph: &PolicyGraph) -> ConfigRequest {
    let profile = graph.segments.iter().fold(
        ManagedObject::new("fvAp")
            .attr("name", &graph.profile.name)
            .attr("descr", &graph.profile.description)
            .child(encode_base(&graph.base)),
        |ap, segment| ap.child(encode_segment(segment)),
    );

    let tenant = ManagedObject::new("fvTenant")
        .attr("name", &graph.tenant)
        .child(profile);

    ConfigRequest::new(ManagedObject::new("polUni").child(tenant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use microseg_common::{
        ContractName, PolicyGraphBuilder, RawTierMap, RelationshipGraph, SharedResources, TierMap,
        TierName,
    };

    fn graph() -> PolicyGraph {
        let shared = SharedResources {
            bridge_domain: "outside-bd".into(),
            base_segment: "cback-epg".into(),
            vmm_domain_dn: "uni/vmmp-VMware/dom-POV".into(),
        };
        let mut raw = RawTierMap::new();
        raw.insert("Web".into(), vec!["10.0.0.1".into(), "10.0.0.2".into()]);
        raw.insert("App".into(), vec!["10.0.1.1".into()]);
        let tiers = TierMap::from_raw(raw).unwrap();

        let mut rels = RelationshipGraph::default();
        let c1 = ContractName::new("c1").unwrap();
        rels.bind(TierName::new("Web").unwrap(), c1.clone(), Direction::Consume);
        rels.bind(TierName::new("App").unwrap(), c1, Direction::Provide);

        PolicyGraphBuilder::new("prod", "shop", &shared).build(&tiers, &rels)
    }

    fn epg<'a>(root: &'a ManagedObject, name: &str) -> &'a ManagedObject {
        root.children[0].children[0]
            .children_of("fvAEPg")
            .find(|e| e.get("name") == Some(name))
            .unwrap()
    }

    #[test]
    fn test_tree_layout() {
        let request = encode(&graph());
        let root = &request.root;

        assert_eq!(root.class, "polUni");
        let tenant = &root.children[0];
        assert_eq!(tenant.class, "fvTenant");
        assert_eq!(tenant.get("name"), Some("prod"));
        let ap = &tenant.children[0];
        assert_eq!(ap.class, "fvAp");
        assert_eq!(ap.get("name"), Some("shop"));

        assert_eq!(root.count_class("fvAEPg"), 3);
        assert_eq!(root.count_class("fvIpAttr"), 3);
        assert_eq!(root.count_class("fvRsCons"), 1);
        assert_eq!(root.count_class("fvRsProv"), 1);
        assert_eq!(root.count_class("fvRsBd"), 3);
    }

    #[test]
    fn test_base_segment_annotation() {
        let request = encode(&graph());
        let base = epg(&request.root, "cback-epg");

        assert_eq!(base.get("pcEnfPref"), Some("unenforced"));
        assert_eq!(base.get("prefGrMemb"), Some("exclude"));
        assert_eq!(base.get("shutdown"), Some("no"));
        assert_eq!(base.get("isAttrBasedEPg"), None);

        let dom = base.children_of("fvRsDomAtt").next().unwrap();
        assert_eq!(dom.get("classPref"), Some("useg"));
        assert_eq!(dom.get("tDn"), Some("uni/vmmp-VMware/dom-POV"));
        assert_eq!(dom.count_class("vmmSecP"), 1);
    }

    #[test]
    fn test_tier_segment_encoding() {
        let request = encode(&graph());
        let web = epg(&request.root, "Web");

        assert_eq!(web.get("isAttrBasedEPg"), Some("yes"));
        assert_eq!(web.get("matchT"), Some("AtleastOne"));
        assert_eq!(
            web.children_of("fvRsBd").next().unwrap().get("tnFvBDName"),
            Some("outside-bd")
        );

        let crtrn = web.children_of("fvCrtrn").next().unwrap();
        assert_eq!(crtrn.get("name"), Some("default"));
        let ips: Vec<_> = crtrn
            .children_of("fvIpAttr")
            .map(|a| (a.get("name").unwrap(), a.get("ip").unwrap()))
            .collect();
        assert_eq!(ips, vec![("0", "10.0.0.1"), ("1", "10.0.0.2")]);

        let cons = web.children_of("fvRsCons").next().unwrap();
        assert_eq!(cons.get("tnVzBrCPName"), Some("c1"));
        assert_eq!(web.children_of("fvRsProv").count(), 0);

        let app = epg(&request.root, "App");
        assert_eq!(app.children_of("fvRsProv").next().unwrap().get("tnVzBrCPName"), Some("c1"));
    }
}
