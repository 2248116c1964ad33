//! Cell values and row snapshots.
//!
//! A [`Row`] is an immutable, ordered column → value snapshot built once from
//! a fetch response. Rows carry no primary key; the full value set is the
//! row's identifier when addressing it for update or delete.

use std::fmt;

use serde::{
  Deserialize, Deserializer, Serialize, Serializer,
  de::{MapAccess, Visitor},
  ser::SerializeMap,
};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single scalar cell.
///
/// Serialised untagged, so a JSON `7` is an integer, `7.5` a real and `"7"`
/// text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }
}

/// Renders the value the way it appears in an input field. `Null` is empty.
impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Integer(i) => write!(f, "{i}"),
      Value::Real(r) => write!(f, "{r}"),
      Value::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// An ordered column → value mapping.
///
/// JSON key order is preserved in both directions, so the header derived from
/// a row matches the order the server produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
  entries: Vec<(String, Value)>,
}

impl Row {
  pub fn get(&self, column: &str) -> Option<&Value> {
    self
      .entries
      .iter()
      .find(|(name, _)| name == column)
      .map(|(_, v)| v)
  }

  pub fn contains(&self, column: &str) -> bool { self.get(column).is_some() }

  /// Column names in snapshot order.
  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(name, _)| name.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.entries.iter().map(|(name, v)| (name.as_str(), v))
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Later duplicates overwrite the earlier value but keep its position.
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut entries: Vec<(String, Value)> = Vec::new();
    for (k, v) in iter {
      let k = k.into();
      let v = v.into();
      match entries.iter_mut().find(|(name, _)| *name == k) {
        Some(slot) => slot.1 = v,
        None => entries.push((k, v)),
      }
    }
    Self { entries }
  }
}

impl Serialize for Row {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (k, v) in &self.entries {
      map.serialize_entry(k, v)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for Row {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct RowVisitor;

    impl<'de> Visitor<'de> for RowVisitor {
      type Value = Row;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object of column name to scalar value")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
          entries.push((k, v));
        }
        Ok(entries.into_iter().collect())
      }
    }

    deserializer.deserialize_map(RowVisitor)
  }
}

// ─── Mutation payloads ───────────────────────────────────────────────────────

/// Body of an update call: the new values plus the identifier snapshot of the
/// row being replaced, exactly as last fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowUpdate {
  pub values:      Row,
  pub identifiers: Row,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_preserves_json_key_order() {
    let row: Row = serde_json::from_str(r#"{"zeta":1,"alpha":"a","mid":null}"#).unwrap();
    assert_eq!(row.columns().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
    assert_eq!(
      serde_json::to_string(&row).unwrap(),
      r#"{"zeta":1,"alpha":"a","mid":null}"#
    );
  }

  #[test]
  fn values_keep_their_json_kind() {
    let row: Row = serde_json::from_str(r#"{"i":7,"r":7.5,"t":"7","n":null}"#).unwrap();
    assert_eq!(row.get("i"), Some(&Value::Integer(7)));
    assert_eq!(row.get("r"), Some(&Value::Real(7.5)));
    assert_eq!(row.get("t"), Some(&Value::Text("7".into())));
    assert_eq!(row.get("n"), Some(&Value::Null));
  }

  #[test]
  fn duplicate_keys_keep_first_position() {
    let row: Row = [("a", Value::Integer(1)), ("b", Value::Integer(2)), ("a", Value::Integer(3))]
      .into_iter()
      .collect();
    assert_eq!(row.len(), 2);
    assert_eq!(row.columns().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(row.get("a"), Some(&Value::Integer(3)));
  }

  #[test]
  fn null_displays_as_empty_field() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::Real(1.5).to_string(), "1.5");
  }
}
