//! Classes of service.

use crate::client::ClientRef;
use crate::object::{string_field, DirectoryEntry};
use serde_json::Value;
use zimbra_core::attrs::{build_attrs_map, AttributeMap};
use zimbra_core::ResourceKind;

/// A class of service.
#[derive(Debug, Clone)]
pub struct Cos {
    /// Zimbra id
    pub id: String,
    /// Name
    pub name: String,
    /// Attributes
    pub attrs: AttributeMap,
    client: ClientRef,
}

impl Cos {
    pub(crate) fn from_fragment(fragment: &Value, client: ClientRef) -> Self {
        Self {
            id: string_field(fragment, "id"),
            name: string_field(fragment, "name"),
            attrs: build_attrs_map(fragment.get("a")),
            client,
        }
    }
}

impl DirectoryEntry for Cos {
    const KIND: ResourceKind = ResourceKind::Cos;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }

    fn client_ref(&self) -> &ClientRef {
        &self.client
    }
}
