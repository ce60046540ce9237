use std::collections::HashMap;

use askplot_core::corpus::CorpusEntry;
use serde::Deserialize;

use super::error::FirestoreError;

pub(crate) const TEXT_FIELD: &str = "text";
pub(crate) const EMBEDDING_FIELD: &str = "embedding";

/// One page of the `ListDocuments` response.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Document {
    /// Full resource name: `projects/{p}/databases/{d}/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

/// A Firestore typed value. Exactly one of the fields is set on the wire; only the kinds
/// relevant to corpus documents are kept, the rest (timestamps, nulls, ...) are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Value {
    string_value: Option<String>,
    double_value: Option<DoubleValue>,
    /// Int64 values are transmitted as decimal strings.
    integer_value: Option<String>,
    array_value: Option<ArrayValue>,
    map_value: Option<MapValue>,
}

/// Doubles arrive as JSON numbers, except the non-finite ones which the REST API spells
/// `"NaN"`, `"Infinity"` and `"-Infinity"`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub(crate) enum DoubleValue {
    Number(f64),
    Text(String),
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub(crate) struct ArrayValue {
    #[serde(default)]
    values: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub(crate) struct MapValue {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Value {
    fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    /// Reads a vector component. Only finite values that fit in an `f32` are accepted.
    fn as_number(&self) -> Result<f32, String> {
        let value = match (&self.double_value, self.integer_value.as_deref()) {
            (Some(DoubleValue::Number(v)), _) => *v,
            (Some(DoubleValue::Text(text)), _) => return Err(format!("is not finite ({})", text)),
            (None, Some(int)) => int.parse::<i64>()
                .map_err(|_| format!("is not a valid integer ({})", int))? as f64,
            (None, None) => return Err("is not a number".to_string()),
        };

        if !value.is_finite() {
            return Err(format!("is not finite ({})", value));
        }
        if value.abs() > f32::MAX as f64 {
            return Err(format!("is out of range for a 32-bit float ({})", value));
        }
        Ok(value as f32)
    }

    /// Decodes an embedding stored either as a plain number array or as a Firestore vector
    /// (`{ "__type__": "__vector__", "value": [...] }`).
    fn as_vector(&self) -> Result<Vec<f32>, String> {
        let array = match (&self.array_value, &self.map_value) {
            (Some(array), _) => array,
            (None, Some(map)) => {
                let is_vector = map.fields.get("__type__").and_then(Value::as_str) == Some("__vector__");
                match (is_vector, map.fields.get("value").and_then(|v| v.array_value.as_ref())) {
                    (true, Some(array)) => array,
                    _ => return Err("map value is not a vector".to_string()),
                }
            }
            (None, None) => return Err("expected an array or vector value".to_string()),
        };

        array.values.iter()
            .enumerate()
            .map(|(i, v)| v.as_number().map_err(|reason| format!("element {} {}", i, reason)))
            .collect()
    }
}

impl Document {
    /// The document id: last segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn into_corpus_entry(self) -> Result<CorpusEntry, FirestoreError> {
        let id = self.id().to_string();
        let malformed = |reason: String| FirestoreError::MalformedDocument { id: id.clone(), reason };

        let text = match self.fields.get(TEXT_FIELD).map(Value::as_str) {
            Some(Some(text)) => text.to_string(),
            Some(None) => return Err(malformed(format!("field '{}' is not a string", TEXT_FIELD))),
            None => return Err(malformed(format!("missing field '{}'", TEXT_FIELD))),
        };

        let embedding = self.fields.get(EMBEDDING_FIELD)
            .ok_or_else(|| malformed(format!("missing field '{}'", EMBEDDING_FIELD)))?
            .as_vector()
            .map_err(|reason| malformed(format!("field '{}': {}", EMBEDDING_FIELD, reason)))?;

        Ok(CorpusEntry::new(id, text, embedding))
    }
}
