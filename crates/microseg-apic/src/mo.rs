//! Managed objects
//!
//! APIC represents every configuration object as
//! `{"<class>": {"attributes": {...}, "children": [...]}}`.

use microseg_common::{MicrosegError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// DN of a tenant
pub fn tenant_dn(tenant: &str) -> String {
    format!("uni/tn-{}", tenant)
}

/// DN of an application profile
pub fn profile_dn(tenant: &str, profile: &str) -> String {
    format!("uni/tn-{}/ap-{}", tenant, profile)
}

/// One node of the APIC object tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedObject {
    pub class: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<ManagedObject>,
}

impl ManagedObject {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Append a child
    pub fn child(mut self, child: ManagedObject) -> Self {
        self.children.push(child);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Direct children of `class`
    pub fn children_of<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a ManagedObject> + 'a {
        self.children.iter().filter(move |c| c.class == class)
    }

    /// Count of objects of `class` anywhere in this subtree, self included
    pub fn count_class(&self, class: &str) -> usize {
        let own = usize::from(self.class == class);
        own + self.children.iter().map(|c| c.count_class(class)).sum::<usize>()
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "attributes".into(),
            Value::Object(
                self.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        if !self.children.is_empty() {
            body.insert(
                "children".into(),
                Value::Array(self.children.iter().map(ManagedObject::to_json).collect()),
            );
        }

        let mut outer = Map::new();
        outer.insert(self.class.clone(), Value::Object(body));
        Value::Object(outer)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let outer = value
            .as_object()
            .filter(|o| o.len() == 1)
            .ok_or_else(|| MicrosegError::transport(format!("malformed managed object: {value}")))?;
        let (class, body) = outer
            .iter()
            .next()
            .ok_or_else(|| MicrosegError::transport("empty managed object"))?;

        let attributes: BTreeMap<String, String> = body
            .get("attributes")
            .and_then(Value::as_object)
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(k, v)| {
                        let v = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), v)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let children: Vec<ManagedObject> = match body.get("children").and_then(Value::as_array) {
            Some(items) => items.iter().map(ManagedObject::from_json).collect::<Result<_>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            class: class.clone(),
            attributes,
            children,
        })
    }
}
