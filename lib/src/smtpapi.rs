use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;

/// SendGrid extended metadata, transmitted as the `x-smtpapi` multipart
/// part alongside the message body.
///
/// Sorted maps keep the serialized JSON stable for a given input, which
/// matters for tests and for providers that hash request bodies.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SmtpApi {
    /// Substitutions: placeholder token -> per-recipient values, aligned
    /// positionally with the `to` list.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    sub: BTreeMap<String, Vec<String>>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    unique_args: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    category: Vec<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    section: BTreeMap<String, String>,

    /// Filter name -> parameter -> value. Values are JSON so that numeric
    /// parameters (e.g. `enabled = 1`) round-trip as numbers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    filters: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl SmtpApi {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_substitution(&mut self, key: &str, values: Vec<String>) {
        self.sub.insert(key.to_string(), values);
    }

    pub fn add_unique_arg(&mut self, key: &str, value: &str) {
        self.unique_args.insert(key.to_string(), value.to_string());
    }

    pub fn add_category(&mut self, category: &str) {
        self.category.push(category.to_string());
    }

    pub fn add_section(&mut self, key: &str, value: &str) {
        self.section.insert(key.to_string(), value.to_string());
    }

    pub fn add_filter(&mut self, filter: &str, param: &str, value: serde_json::Value) {
        self.filters
            .entry(filter.to_string())
            .or_default()
            .insert(param.to_string(), value);
    }

    pub fn substitutions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.sub
    }

    /// True iff no metadata has been set at all. An empty block is not
    /// transmitted on the wire.
    pub fn is_empty(&self) -> bool {
        self.sub.is_empty()
            && self.unique_args.is_empty()
            && self.category.is_empty()
            && self.section.is_empty()
            && self.filters.is_empty()
    }

    pub fn json_string(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_serializes_to_empty_object() {
        let api = SmtpApi::new();
        assert!(api.is_empty());
        assert_eq!(api.json_string().unwrap(), "{}");
    }

    #[test]
    fn substitutions_appear_under_sub() {
        let mut api = SmtpApi::new();
        api.add_substitution("${code}", vec!["123".to_string()]);

        assert!(!api.is_empty());
        let json = api.json_string().unwrap();
        assert_eq!(json, r#"{"sub":{"${code}":["123"]}}"#);
    }

    #[test]
    fn filters_keep_numeric_values() {
        let mut api = SmtpApi::new();
        api.add_filter("templates", "enabled", 1.into());
        api.add_filter("templates", "template_id", "abc-123".into());

        let json = api.json_string().unwrap();
        assert_eq!(
            json,
            r#"{"filters":{"templates":{"enabled":1,"template_id":"abc-123"}}}"#
        );
    }

    #[test]
    fn all_fields_serialize() {
        let mut api = SmtpApi::new();
        api.add_substitution("${a}", vec!["1".to_string()]);
        api.add_unique_arg("order", "555");
        api.add_category("welcome");
        api.add_section(":name", "valued customer");
        api.add_filter("templates", "enabled", 1.into());

        let parsed: serde_json::Value = serde_json::from_str(&api.json_string().unwrap()).unwrap();
        assert!(parsed.get("sub").is_some());
        assert!(parsed.get("unique_args").is_some());
        assert!(parsed.get("category").is_some());
        assert!(parsed.get("section").is_some());
        assert!(parsed.get("filters").is_some());
        assert!(parsed.get("to").is_none());
    }
}
