//! Fabric controller seam
//!
//! Everything above this module talks to the controller through
//! [`FabricController`]; [`crate::ApicClient`] is the REST implementation and
//! [`crate::InMemoryFabric`] the in-process one.

use crate::mo::ManagedObject;
use async_trait::async_trait;
use microseg_common::Result;
use serde_json::{json, Value};

/// Property filter of a class query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropFilter {
    /// `eq(<class>.<property>,"<value>")`
    Eq { property: String, value: String },
}

impl PropFilter {
    /// Render as an APIC `query-target-filter` expression
    pub fn expression(&self, class: &str) -> String {
        match self {
            Self::Eq { property, value } => format!("eq({}.{},\"{}\")", class, property, value),
        }
    }

    pub fn matches(&self, mo: &ManagedObject) -> bool {
        match self {
            Self::Eq { property, value } => mo.get(property) == Some(value.as_str()),
        }
    }
}

/// Query for objects of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassQuery {
    pub class: String,
    /// Restrict to the subtree under this DN
    pub scope: Option<String>,
    pub filter: Option<PropFilter>,
    /// Child classes returned alongside each match
    pub child_classes: Vec<String>,
}

impl ClassQuery {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            scope: None,
            filter: None,
            child_classes: Vec::new(),
        }
    }

    /// Match objects whose `property` equals `value`
    pub fn eq(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(PropFilter::Eq {
            property: property.into(),
            value: value.into(),
        });
        self
    }

    /// Search only below `dn`
    pub fn under(mut self, dn: impl Into<String>) -> Self {
        self.scope = Some(dn.into());
        self
    }

    pub fn with_children(mut self, classes: &[&str]) -> Self {
        self.child_classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// REST path and query parameters for this query
    pub fn to_request(&self) -> (String, Vec<(String, String)>) {
        let mut params = Vec::new();
        let path = match &self.scope {
            Some(dn) => {
                params.push(("query-target".to_string(), "subtree".to_string()));
                params.push(("target-subtree-class".to_string(), self.class.clone()));
                format!("/api/node/mo/{}.json", dn)
            }
            None => format!("/api/node/class/{}.json", self.class),
        };

        if let Some(filter) = &self.filter {
            params.push(("query-target-filter".to_string(), filter.expression(&self.class)));
        }
        if !self.child_classes.is_empty() {
            params.push(("rsp-subtree".to_string(), "children".to_string()));
            params.push(("rsp-subtree-class".to_string(), self.child_classes.join(",")));
        }

        (path, params)
    }
}

/// Single configuration transaction rooted at `polUni`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub root: ManagedObject,
}

impl ConfigRequest {
    pub fn new(root: ManagedObject) -> Self {
        Self { root }
    }

    /// REST path the transaction is posted to
    pub fn path(&self) -> &'static str {
        "/api/mo/uni.json"
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }
}

impl Default for ConfigRequest {
    fn default() -> Self {
        Self::new(ManagedObject::new("polUni"))
    }
}

/// Operations the compiler needs from a fabric controller
#[async_trait]
pub trait FabricController: Send + Sync {
    /// Objects matching `query`
    async fn query(&self, query: &ClassQuery) -> Result<Vec<ManagedObject>>;

    /// Apply `request` atomically
    async fn commit(&self, request: &ConfigRequest) -> Result<()>;
}

/// Login payload for `/api/aaaLogin.json`
pub(crate) fn login_body(login: &str, password: &str) -> Value {
    json!({ "aaaUser": { "attributes": { "name": login, "pwd": password } } })
}
