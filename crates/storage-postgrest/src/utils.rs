use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts both uuid (string) and bigint (number) primary keys.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    #[test]
    fn test_deserialize_id_accepts_strings_and_numbers() {
        let row: Row = serde_json::from_str(r#"{"id":"4f1c"}"#).unwrap();
        assert_eq!(row.id, "4f1c");
        let row: Row = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(row.id, "42");
        assert!(serde_json::from_str::<Row>(r#"{"id":null}"#).is_err());
    }
}
