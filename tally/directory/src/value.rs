//! Firestore's typed JSON encoding of document fields.
//!
//! Every value is an object with exactly one key naming its type, e.g.
//! `{"stringValue": "abc"}`. 64-bit integers are encoded as decimal strings.

use {
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

pub type Fields = BTreeMap<String, Value>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "int_string")] i64),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ReferenceValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

impl Value {
    pub fn string<S>(s: S) -> Self
    where
        S: Into<String>,
    {
        Self::StringValue(s.into())
    }

    pub fn array<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::ArrayValue(ArrayValue {
            values: values.into_iter().collect(),
        })
    }

    pub fn map(fields: Fields) -> Self {
        Self::MapValue(MapValue { fields })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integers are also accepted when stored as whole doubles, which is what
    /// the JavaScript SDK writes for numbers it can't tell are integral.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::IntegerValue(i) => u64::try_from(*i).ok(),
            Value::DoubleValue(d) if d.fract() == 0.0 && *d >= 0.0 && *d <= u64::MAX as f64 => {
                Some(*d as u64)
            },
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::ArrayValue(array) => Some(array.values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::MapValue(map) => Some(&map.fields),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        // Firestore integers are signed 64-bit; ids never get near the limit.
        Self::IntegerValue(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// A document as returned by the REST API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing)]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing)]
    pub update_time: Option<String>,
}

impl Document {
    /// The last segment of the document's resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

mod int_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrInt {
            String(String),
            Int(i64),
        }

        match StringOrInt::deserialize(deserializer)? {
            StringOrInt::String(s) => s.parse().map_err(de::Error::custom),
            StringOrInt::Int(i) => Ok(i),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assert_json_diff::assert_json_eq, assertor::*, serde_json::json};

    #[test]
    fn integers_are_strings_on_the_wire() {
        assert_json_eq!(
            serde_json::to_value(Value::IntegerValue(42)).unwrap(),
            json!({ "integerValue": "42" })
        );

        let value: Value = serde_json::from_value(json!({ "integerValue": "7" })).unwrap();
        assert_that!(value.as_u64()).is_equal_to(Some(7));
    }

    #[test]
    fn decoding_a_document() {
        let document: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/votesID/currentID",
            "fields": {
                "currentID": { "integerValue": "3" },
                "group": {
                    "mapValue": {
                        "fields": {
                            "1": { "arrayValue": { "values": [{ "stringValue": "0xabc" }] } },
                            "2": { "arrayValue": {} }
                        }
                    }
                }
            },
            "createTime": "2024-05-01T10:00:00.000000Z",
            "updateTime": "2024-05-01T10:00:00.000000Z"
        }))
        .unwrap();

        assert_that!(document.id()).is_equal_to("currentID");
        assert_that!(document.fields["currentID"].as_u64()).is_equal_to(Some(3));

        let group = document.fields["group"].as_map().unwrap();
        assert_that!(group["1"].as_array().unwrap().to_vec()).has_length(1);
        assert_that!(group["2"].as_array().unwrap().to_vec()).is_empty();
    }

    #[test]
    fn whole_doubles_read_as_integers() {
        assert_that!(Value::DoubleValue(4.0).as_u64()).is_equal_to(Some(4));
        assert_that!(Value::DoubleValue(4.5).as_u64()).is_none();
        assert_that!(Value::DoubleValue(-1.0).as_u64()).is_none();
    }
}
