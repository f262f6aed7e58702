//! Stock record identifiers and the policies that allocate them.

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a stock record, unique within a ledger.
///
/// Serialized as a bare JSON number for sequential ids and as a string for
/// tokens and labels, which keeps files written by older tools readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    /// Sequential integer id (`max + 1` allocation).
    Sequential(u64),
    /// Opaque, globally unique token (UUIDv7).
    Token(Uuid),
    /// Free-text id found in a store written by another tool. Never allocated
    /// by the ledger itself.
    Label(String),
}

impl RecordId {
    /// Create a fresh token id.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing ids explicitly in tests for
    /// determinism.
    pub fn new_token() -> Self {
        Self::Token(Uuid::now_v7())
    }

    /// Placeholder for a record stored without a usable id; the ledger
    /// assigns a real one on load.
    pub fn missing() -> Self {
        Self::Label(String::new())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Label(label) if label.is_empty())
    }

    pub fn as_sequential(&self) -> Option<u64> {
        match self {
            Self::Sequential(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Sequential(n) if *n > 0)
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Self::Token(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential(n) => fmt::Display::fmt(n, f),
            Self::Token(uuid) => fmt::Display::fmt(uuid, f),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self::Sequential(value)
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self::Token(value)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    /// Parses an operator-supplied id: digits are sequential ids, anything else
    /// must be a UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_id("RecordId: empty"));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let n = s
                .parse::<u64>()
                .map_err(|e| DomainError::invalid_id(format!("RecordId: {e}")))?;
            return Ok(Self::Sequential(n));
        }
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("RecordId: {e}")))?;
        Ok(Self::Token(uuid))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Sequential(n) => serializer.serialize_u64(*n),
            Self::Token(uuid) => serializer.collect_str(uuid),
            Self::Label(label) => serializer.serialize_str(label),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordIdVisitor)
    }
}

struct RecordIdVisitor;

impl Visitor<'_> for RecordIdVisitor {
    type Value = RecordId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a record id")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
        Ok(RecordId::Sequential(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
        Ok(u64::try_from(v)
            .map(RecordId::Sequential)
            .unwrap_or_else(|_| RecordId::Label(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RecordId, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
            Ok(RecordId::Sequential(v as u64))
        } else {
            Ok(RecordId::Label(v.to_string()))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
        Ok(v.parse().unwrap_or_else(|_| RecordId::Label(v.to_string())))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RecordId, E> {
        Ok(RecordId::Label(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RecordId, E> {
        Ok(RecordId::missing())
    }

    fn visit_none<E: de::Error>(self) -> Result<RecordId, E> {
        Ok(RecordId::missing())
    }
}

/// How the ledger allocates ids for new records.
///
/// Pick one per deployment; the two are not interchangeable once records have
/// been written.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// One greater than the current maximum sequential id.
    #[default]
    Sequential,
    /// Fresh UUIDv7 token per record.
    Token,
}

impl FromStr for IdPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(Self::Sequential),
            "token" | "uuid" => Ok(Self::Token),
            other => Err(DomainError::validation(format!("unknown id policy: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digits_as_sequential() {
        assert_eq!("42".parse::<RecordId>().unwrap(), RecordId::Sequential(42));
        assert_eq!(" 7 ".parse::<RecordId>().unwrap(), RecordId::Sequential(7));
    }

    #[test]
    fn parses_uuid_as_token() {
        let uuid = Uuid::now_v7();
        let id: RecordId = uuid.to_string().parse().unwrap();
        assert_eq!(id, RecordId::Token(uuid));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(
            "".parse::<RecordId>(),
            Err(DomainError::InvalidId(_))
        ));
        assert!(matches!(
            "vinho-tinto".parse::<RecordId>(),
            Err(DomainError::InvalidId(_))
        ));
    }

    #[test]
    fn deserializes_legacy_shapes() {
        let ids: Vec<RecordId> =
            serde_json::from_str(r#"[3, "12", "vinho-reserva", 4.0]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                RecordId::Sequential(3),
                RecordId::Sequential(12),
                RecordId::Label("vinho-reserva".to_string()),
                RecordId::Sequential(4),
            ]
        );
    }

    #[test]
    fn unusable_ids_deserialize_as_labels() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[null, -1, true]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                RecordId::missing(),
                RecordId::Label("-1".to_string()),
                RecordId::Label("true".to_string()),
            ]
        );
        assert!(ids.iter().all(|id| !id.is_sequential()));
    }

    #[test]
    fn serializes_sequential_as_number() {
        let json = serde_json::to_string(&RecordId::Sequential(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn fresh_tokens_are_distinct() {
        assert_ne!(RecordId::new_token(), RecordId::new_token());
    }

    #[test]
    fn id_policy_from_str() {
        assert_eq!("token".parse::<IdPolicy>().unwrap(), IdPolicy::Token);
        assert_eq!("Sequential".parse::<IdPolicy>().unwrap(), IdPolicy::Sequential);
        assert!("slug".parse::<IdPolicy>().is_err());
    }
}
