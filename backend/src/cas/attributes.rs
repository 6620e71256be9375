//! Attribute lookup over the `<cas:attributes>` block of a success response.
//!
//! CAS servers disagree on whether attribute elements carry the `cas:`
//! prefix. Lookups always try `cas:<name>` first and the bare `<name>`
//! second, so the namespaced value wins when both are present.

use crate::cas::config::AttributeMapping;
use crate::cas::xml::XmlElement;
use std::collections::BTreeMap;

const CAS_PREFIX: &str = "cas:";

/// Identity fields that can be mapped to CAS attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    EmployeeId,
    Username,
    FullName,
    Email,
}

impl AttributeMapping {
    /// Configured CAS attribute name for a field.
    pub fn attribute_name(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::EmployeeId => &self.employee_id,
            IdentityField::Username => &self.username,
            IdentityField::FullName => &self.full_name,
            IdentityField::Email => &self.email,
        }
    }
}

/// Attribute values keyed by element name as received (`cas:mail`, `mail`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasAttributes {
    values: BTreeMap<String, Vec<String>>,
}

impl CasAttributes {
    /// Collects the children of an `attributes` element. Repeated elements
    /// keep every value in document order.
    pub fn from_element(element: Option<&XmlElement>) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(element) = element {
            for child in &element.children {
                values
                    .entry(child.name.clone())
                    .or_default()
                    .push(child.text().to_string());
            }
        }
        Self { values }
    }

    /// First non-empty value stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.iter().find(|value| !value.is_empty()))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All attributes with the `cas:` prefix removed. Multi-valued
    /// attributes are joined with `,`; a namespaced key overrides its bare twin.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        let (namespaced, bare): (Vec<_>, Vec<_>) = self
            .values
            .iter()
            .partition(|(key, _)| key.starts_with(CAS_PREFIX));

        for (key, values) in bare.into_iter().chain(namespaced) {
            flat.insert(strip_cas_prefix(key).to_string(), values.join(","));
        }
        flat
    }
}

fn strip_cas_prefix(name: &str) -> &str {
    name.strip_prefix(CAS_PREFIX).unwrap_or(name)
}

/// Looks up a mapped identity field, trying `cas:<name>` then `<name>`.
pub fn extract_attribute<'a>(
    attributes: &'a CasAttributes,
    field: IdentityField,
    mapping: &AttributeMapping,
) -> Option<&'a str> {
    let bare = strip_cas_prefix(mapping.attribute_name(field));
    if bare.is_empty() {
        return None;
    }

    let namespaced = format!("{}{}", CAS_PREFIX, bare);
    attributes
        .get(&namespaced)
        .or_else(|| attributes.get(bare))
}
