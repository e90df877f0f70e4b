//! Resource record model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Region value carried by records of global-scope resource types
pub const GLOBAL_REGION: &str = "global";

/// A single typed field value on a resource record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-form string value
    Str(String),
    /// Integer value (counts, sizes, ports)
    Int(i64),
    /// Timestamp value
    Time(DateTime<Utc>),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Time(value)
    }
}

/// One discovered resource
///
/// Produced exactly once per real-world resource by exactly one scan unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource-type identifier of the scanner that produced this record
    pub resource_type: String,
    /// Owning account id
    pub account_id: String,
    /// Owning account name
    pub account_name: String,
    /// Region the resource lives in, or [`GLOBAL_REGION`]
    pub region: String,
    /// Resource-specific fields
    pub fields: BTreeMap<String, FieldValue>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

impl ResourceRecord {
    /// Create an empty record for the given unit coordinates
    pub fn new(
        resource_type: impl Into<String>,
        account_id: impl Into<String>,
        account_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            account_id: account_id.into(),
            account_name: account_name.into(),
            region: region.into(),
            fields: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Set a field
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set a field if the value is present
    #[must_use]
    pub fn field_opt<V: Into<FieldValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    /// Replace the tag map
    #[must_use]
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Value of the `Name` tag, if any
    #[must_use]
    pub fn name_tag(&self) -> Option<&str> {
        self.tags.get("Name").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields_and_skips_absent_options() {
        let record = ResourceRecord::new("ec2-instances", "111111111111", "prod", "us-east-1")
            .field("instance_id", "i-0abc")
            .field("memory_mb", 1024)
            .field_opt("public_ip", None::<&str>)
            .field_opt("private_ip", Some("10.0.0.5"));

        assert_eq!(
            record.fields.get("instance_id"),
            Some(&FieldValue::Str("i-0abc".to_string()))
        );
        assert_eq!(record.fields.get("memory_mb"), Some(&FieldValue::Int(1024)));
        assert!(!record.fields.contains_key("public_ip"));
        assert!(record.fields.contains_key("private_ip"));
    }

    #[test]
    fn name_tag_lookup() {
        let mut tags = BTreeMap::new();
        tags.insert("Name".to_string(), "web-1".to_string());
        tags.insert("env".to_string(), "prod".to_string());

        let record = ResourceRecord::new("ec2-instances", "111111111111", "prod", "us-east-1")
            .with_tags(tags);

        assert_eq!(record.name_tag(), Some("web-1"));
    }
}
