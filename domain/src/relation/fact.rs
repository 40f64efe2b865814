//! Relation fact values and their typed interpretations.
//!
//! Peers publish loosely structured string values. Instead of trusting their
//! shape, every recognized key declares a [`FactKind`] and raw values are
//! parsed into a [`KnownFact`], with an explicit `Malformed` variant for
//! payloads that do not match.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::Ipv4Addr;

/// A value stored for a `(relation, peer, key)` triple.
///
/// `Null` is an explicit removal signal from the peer and is kept distinct
/// from "key never reported", which is represented by the key being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Value(String),
    Null,
}

impl FactValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FactValue::Value(v) => Some(v),
            FactValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FactValue::Null)
    }
}

impl From<&str> for FactValue {
    fn from(s: &str) -> Self {
        FactValue::Value(s.to_string())
    }
}

impl From<Option<String>> for FactValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(v) => FactValue::Value(v),
            None => FactValue::Null,
        }
    }
}

/// Result of reading one key from the relation substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactLookup {
    /// The peer never published this key.
    Absent,
    /// The peer published an explicit null.
    Null,
    Value(String),
}

impl FactLookup {
    /// Convert into a storable value; `None` for absent keys.
    pub fn into_fact(self) -> Option<FactValue> {
        match self {
            FactLookup::Absent => None,
            FactLookup::Null => Some(FactValue::Null),
            FactLookup::Value(v) => Some(FactValue::Value(v)),
        }
    }
}

/// Declared shape of a recognized relation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Text,
    Address,
    Flag,
    /// JSON-encoded object, e.g. `auth-info`.
    JsonObject,
    /// JSON-encoded list, e.g. `analytics-server`.
    JsonList,
}

/// A fact value interpreted according to its [`FactKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum KnownFact {
    Text(String),
    Address(Ipv4Addr),
    Flag(bool),
    Object(Map<String, Value>),
    List(Vec<Value>),
    /// Explicit null from the peer.
    Cleared,
    Malformed { reason: String },
}

impl KnownFact {
    pub fn parse(kind: FactKind, value: &FactValue) -> Self {
        let raw = match value {
            FactValue::Null => return KnownFact::Cleared,
            FactValue::Value(raw) => raw,
        };

        match kind {
            FactKind::Text => KnownFact::Text(raw.clone()),
            FactKind::Address => match crate::core::ip::parse_ipv4(raw) {
                Some(ip) => KnownFact::Address(ip),
                None => KnownFact::Malformed {
                    reason: format!("'{}' is not an IPv4 address", raw),
                },
            },
            FactKind::Flag => match parse_flag(raw) {
                Some(flag) => KnownFact::Flag(flag),
                None => KnownFact::Malformed {
                    reason: format!("'{}' is not a boolean", raw),
                },
            },
            FactKind::JsonObject => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => KnownFact::Object(map),
                Ok(_) => KnownFact::Malformed {
                    reason: "expected a JSON object".to_string(),
                },
                Err(e) => KnownFact::Malformed {
                    reason: e.to_string(),
                },
            },
            FactKind::JsonList => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => KnownFact::List(items),
                Ok(_) => KnownFact::Malformed {
                    reason: "expected a JSON list".to_string(),
                },
                Err(e) => KnownFact::Malformed {
                    reason: e.to_string(),
                },
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, KnownFact::Malformed { .. })
    }
}

/// Parse the boolean spellings peers are known to publish.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_value_serde_null() {
        let json = serde_json::to_string(&FactValue::Null).unwrap();
        assert_eq!(json, "null");
        let back: FactValue = serde_json::from_str("null").unwrap();
        assert_eq!(back, FactValue::Null);
        let value: FactValue = serde_json::from_str("\"10.0.0.1\"").unwrap();
        assert_eq!(value, FactValue::from("10.0.0.1"));
    }

    #[test]
    fn test_lookup_into_fact() {
        assert_eq!(FactLookup::Absent.into_fact(), None);
        assert_eq!(FactLookup::Null.into_fact(), Some(FactValue::Null));
        assert_eq!(
            FactLookup::Value("x".into()).into_fact(),
            Some(FactValue::from("x"))
        );
    }

    #[test]
    fn test_parse_json_object() {
        let fact = KnownFact::parse(
            FactKind::JsonObject,
            &FactValue::from(r#"{"keystone_ip": "10.0.0.5"}"#),
        );
        match fact {
            KnownFact::Object(map) => assert_eq!(map["keystone_ip"], "10.0.0.5"),
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_payloads() {
        assert!(
            KnownFact::parse(FactKind::JsonObject, &FactValue::from("{not json")).is_malformed()
        );
        assert!(KnownFact::parse(FactKind::JsonObject, &FactValue::from("[1, 2]")).is_malformed());
        assert!(KnownFact::parse(FactKind::JsonList, &FactValue::from("{}")).is_malformed());
        assert!(KnownFact::parse(FactKind::Address, &FactValue::from("host-1")).is_malformed());
        assert!(KnownFact::parse(FactKind::Flag, &FactValue::from("maybe")).is_malformed());
    }

    #[test]
    fn test_parse_null_is_cleared() {
        assert_eq!(
            KnownFact::parse(FactKind::JsonObject, &FactValue::Null),
            KnownFact::Cleared
        );
    }

    #[test]
    fn test_parse_flag_spellings() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), Some(true));
        assert_eq!(parse_flag("perhaps"), None);
    }
}
