use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// ServiceAnnouncement describes one service a node advertises to the
/// discovery registry. Values are immutable: changing a property means
/// building a new announcement with a fresh id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAnnouncement {
    id: Uuid,

    #[serde(rename = "type")]
    announcement_type: String,

    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl ServiceAnnouncement {
    /// Start building an announcement of the given type
    pub fn builder(announcement_type: impl Into<String>) -> ServiceAnnouncementBuilder {
        ServiceAnnouncementBuilder {
            announcement_type: announcement_type.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn announcement_type(&self) -> &str {
        &self.announcement_type
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Look up a single property value
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Builder for [`ServiceAnnouncement`]
#[derive(Clone, Debug)]
pub struct ServiceAnnouncementBuilder {
    announcement_type: String,
    properties: BTreeMap<String, String>,
}

impl ServiceAnnouncementBuilder {
    pub fn add_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn add_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in properties {
            self.properties.insert(key.into(), value.into());
        }
        self
    }

    /// Build the announcement with a newly generated id
    pub fn build(self) -> ServiceAnnouncement {
        ServiceAnnouncement {
            id: Uuid::new_v4(),
            announcement_type: self.announcement_type,
            properties: self.properties,
        }
    }
}
