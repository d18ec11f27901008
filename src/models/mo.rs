//! Managed object model
//!
//! Every APIC object is encoded as a single-key JSON map from the class name
//! to its body:
//!
//! ```json
//! {"infraAccPortGrp": {"attributes": {"name": "pg1"}, "children": [...]}}
//! ```

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a managed object. APIC encodes every value as a string.
pub type MoAttributes = BTreeMap<String, String>;

/// A managed object with its class, attributes and child objects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagedObject {
    pub class: String,
    pub attributes: MoAttributes,
    pub children: Vec<ManagedObject>,
}

impl ManagedObject {
    /// Create an object with no attributes or children
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attributes: MoAttributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: ManagedObject) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Children of the given class
    pub fn children_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ManagedObject> {
        self.children.iter().filter(move |c| c.class == class)
    }

    /// True when the object carries neither attributes nor children
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}

#[derive(Serialize)]
struct BodyRef<'a> {
    attributes: &'a MoAttributes,
    #[serde(skip_serializing_if = "no_children")]
    children: &'a [ManagedObject],
}

fn no_children(children: &&[ManagedObject]) -> bool {
    children.is_empty()
}

#[derive(Deserialize)]
struct Body {
    #[serde(default)]
    attributes: MoAttributes,
    #[serde(default)]
    children: Vec<ManagedObject>,
}

impl Serialize for ManagedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.class,
            &BodyRef {
                attributes: &self.attributes,
                children: &self.children,
            },
        )?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ManagedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, Body>::deserialize(deserializer)?;
        if map.len() != 1 {
            return Err(de::Error::custom(format!(
                "managed object must have exactly one class key, found {}",
                map.len()
            )));
        }

        let (class, body) = map
            .into_iter()
            .next()
            .ok_or_else(|| de::Error::custom("empty managed object"))?;

        Ok(Self {
            class,
            attributes: body.attributes,
            children: body.children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_nested_object() {
        let value = json!({
            "infraAccBndlGrp": {
                "attributes": {"name": "pg1", "lagT": "node", "dn": "uni/infra/funcprof/accbundle-pg1"},
                "children": [
                    {"infraRsHIfPol": {"attributes": {"tnFabricHIfPolName": "llp1"}}},
                    {"infraRsCdpIfPol": {"attributes": {"tnCdpIfPolName": "default"}}}
                ]
            }
        });

        let mo: ManagedObject = serde_json::from_value(value).unwrap();
        assert_eq!(mo.class, "infraAccBndlGrp");
        assert_eq!(mo.attribute("lagT"), Some("node"));
        assert_eq!(mo.children.len(), 2);
        assert_eq!(
            mo.children_of("infraRsHIfPol").next().unwrap().attribute("tnFabricHIfPolName"),
            Some("llp1")
        );
    }

    #[test]
    fn test_serialize_omits_empty_children() {
        let mo = ManagedObject::new("infraAccPortGrp").with_attribute("name", "pg1");
        let value = serde_json::to_value(&mo).unwrap();
        assert_eq!(value, json!({"infraAccPortGrp": {"attributes": {"name": "pg1"}}}));
    }

    #[test]
    fn test_reject_multiple_class_keys() {
        let value = json!({"a": {"attributes": {}}, "b": {"attributes": {}}});
        assert!(serde_json::from_value::<ManagedObject>(value).is_err());
    }
}
