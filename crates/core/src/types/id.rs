//! Newtype IDs for type-safe entity references.
//!
//! The backend hands out identifiers either as strings (document ids) or as
//! integers depending on the collection, so every ID wraps a `String` and
//! accepts both JSON shapes on the way in. IDs always serialize as strings.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from a JSON string or integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<&str>`, `From<String>`, `From<i64>` and `Display`
///
/// # Example
///
/// ```rust
/// # use lampstand_core::define_id;
/// define_id!(TopicId);
/// define_id!(QuestionId);
///
/// let topic_id = TopicId::new("t-1");
/// let question_id = QuestionId::from(7);
/// assert_eq!(question_id.as_str(), "7");
///
/// // These are different types, so this won't compile:
/// // let _: TopicId = question_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                <$crate::types::id::RawId as ::serde::Deserialize>::deserialize(deserializer)
                    .map(|raw| Self(raw.into_string()))
            }
        }
    };
}

/// Wire representation of an identifier before it is wrapped.
#[doc(hidden)]
#[derive(serde::Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl RawId {
    #[doc(hidden)]
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Signed(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
        }
    }
}

/// Entity `id` fields on the wire.
///
/// Documents arrive with `_id`, `id`, or both (when the backend also emits
/// its virtual `id`). When both are present `_id` wins. Always serialized as
/// `id`. Used as `#[serde(flatten, with = "document_id")]`.
pub(crate) mod document_id {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    struct Ids<T> {
        #[serde(rename = "_id")]
        document: Option<T>,
        id: Option<T>,
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let ids = Ids::<T>::deserialize(deserializer)?;
        ids.document
            .or(ids.id)
            .ok_or_else(|| D::Error::missing_field("id"))
    }

    pub fn serialize<S, T>(id: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("id", id)?;
        map.end()
    }
}

define_id!(TopicId);
define_id!(QuestionId);
define_id!(AnswerId);
define_id!(MessageId);
define_id!(ThreadId);
define_id!(ActivityId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string_json() {
        let id: TopicId = serde_json::from_str("\"64f0c2\"").unwrap();
        assert_eq!(id.as_str(), "64f0c2");
    }

    #[test]
    fn test_id_from_integer_json() {
        let id: MessageId = serde_json::from_str("42").unwrap();
        assert_eq!(id, MessageId::new("42"));
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = QuestionId::from(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"9\"");
    }

    #[test]
    fn test_id_rejects_objects() {
        let result: Result<ThreadId, _> = serde_json::from_str("{\"id\": 1}");
        assert!(result.is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(UserId::new("u-1").to_string(), "u-1");
    }
}
