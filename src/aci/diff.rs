//! Payload staging and diff computation
//!
//! Attribute values are plain strings, so any difference is a straight
//! replace. Children are matched by class; when several existing children of
//! the same class exist, the one the proposal is a subset of wins.

use super::{ChildConfig, ConfigAttributes};
use crate::models::{ManagedObject, MoAttributes};

/// Drop attributes without a value
fn present_attributes(attributes: &ConfigAttributes) -> MoAttributes {
    attributes
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
        .collect()
}

/// Build the proposed document from the desired configuration
///
/// Children without any value are omitted entirely.
pub fn build_proposed(
    aci_class: &str,
    class_config: &ConfigAttributes,
    child_configs: &[ChildConfig],
) -> ManagedObject {
    let children = child_configs
        .iter()
        .filter(|child| child.has_value())
        .map(|child| ManagedObject {
            class: child.class.clone(),
            attributes: present_attributes(&child.attributes),
            children: Vec::new(),
        })
        .collect();

    ManagedObject {
        class: aci_class.to_string(),
        attributes: present_attributes(class_config),
        children,
    }
}

/// Attributes of `proposed` whose value differs from `existing`
fn changed_attributes(proposed: &MoAttributes, existing: &MoAttributes) -> MoAttributes {
    proposed
        .iter()
        .filter(|(k, v)| existing.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn is_subset(proposed: &MoAttributes, existing: &MoAttributes) -> bool {
    proposed.iter().all(|(k, v)| existing.get(k) == Some(v))
}

/// Existing child to compare a proposed child against
fn matching_child<'a>(
    proposed: &ManagedObject,
    existing_children: &'a [ManagedObject],
) -> Option<&'a ManagedObject> {
    let mut candidate = None;
    for child in existing_children.iter().filter(|c| c.class == proposed.class) {
        candidate = Some(child);
        if is_subset(&proposed.attributes, &child.attributes) {
            break;
        }
    }
    candidate
}

/// New or changed children of the proposal
fn changed_children(proposed: &ManagedObject, existing: &ManagedObject) -> Vec<ManagedObject> {
    proposed
        .children
        .iter()
        .filter_map(|child| match matching_child(child, &existing.children) {
            None => Some(child.clone()),
            Some(current) => {
                let attributes = changed_attributes(&child.attributes, &current.attributes);
                if attributes.is_empty() {
                    None
                } else {
                    Some(ManagedObject {
                        class: child.class.clone(),
                        attributes,
                        children: Vec::new(),
                    })
                }
            }
        })
        .collect()
}

/// Document to submit so that `existing` converges to `proposed`
///
/// Returns `None` when nothing needs to change.
pub fn compute_diff(proposed: &ManagedObject, existing: Option<&ManagedObject>) -> Option<ManagedObject> {
    let Some(existing) = existing else {
        return Some(proposed.clone());
    };

    let config = ManagedObject {
        class: proposed.class.clone(),
        attributes: changed_attributes(&proposed.attributes, &existing.attributes),
        children: changed_children(proposed, existing),
    };

    if config.is_empty() {
        None
    } else {
        Some(config)
    }
}
