//! COALESCE-style partial-update patches.
//!
//! The original system lets callers PUT a sparse JSON object and relies on
//! SQL `COALESCE(new, old)` to leave absent fields untouched. That collapses
//! "field omitted" and "field explicitly set to null" into the same
//! behaviour. `Patch<T>` keeps the three states distinct so a caller can
//! actually null out an optional column.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// The field was not present in the request body: preserve the
    /// existing value.
    #[default]
    Absent,
    /// The field was present and non-null: set it to this value.
    Set(T),
    /// The field was present and explicitly `null`: clear it.
    Null,
}

impl<T> Patch<T> {
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Fold this patch into an existing `Option<T>` field, applying COALESCE
    /// semantics: `Absent` preserves, `Null` clears, `Set` overwrites.
    pub fn apply_to(self, existing: &mut Option<T>) {
        match self {
            Self::Absent => {}
            Self::Null => *existing = None,
            Self::Set(v) => *existing = Some(v),
        }
    }

    /// Fold this patch into a required field; `Null` is a no-op since
    /// required fields cannot be cleared (callers validate this upstream).
    pub fn apply_required(self, existing: &mut T) {
        if let Self::Set(v) = self {
            *existing = v;
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Null => Patch::Null,
            Self::Set(v) => Patch::Set(f(v)),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(v) => Self::Set(v),
            None => Self::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Set(v) => serializer.serialize_some(v),
        }
    }
}

/// Deserializes a `Patch<T>` field, defaulting to `Absent` when the JSON
/// key is missing entirely. Apply with `#[serde(default, deserialize_with = "patch::deserialize")]`.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Patch::deserialize(deserializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize")]
        name: Patch<String>,
    }

    #[test]
    fn missing_key_is_absent() {
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.name, Patch::Absent);
    }

    #[test]
    fn explicit_null_is_null() {
        let p: Probe = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(p.name, Patch::Null);
    }

    #[test]
    fn present_value_is_set() {
        let p: Probe = serde_json::from_str(r#"{"name": "D1"}"#).unwrap();
        assert_eq!(p.name, Patch::Set("D1".to_string()));
    }

    #[test]
    fn apply_to_preserves_on_absent() {
        let mut existing = Some(5i32);
        Patch::<i32>::Absent.apply_to(&mut existing);
        assert_eq!(existing, Some(5));
    }

    #[test]
    fn apply_to_clears_on_null() {
        let mut existing = Some(5i32);
        Patch::<i32>::Null.apply_to(&mut existing);
        assert_eq!(existing, None);
    }

    #[test]
    fn apply_to_overwrites_on_set() {
        let mut existing = Some(5i32);
        Patch::Set(9i32).apply_to(&mut existing);
        assert_eq!(existing, Some(9));
    }
}
