//! Schema Completer — guarantees callers always get the full response shape,
//! whatever subset the generator actually produced.

use serde_json::{Map, Value};

/// Keys every preference-mode recommendation carries, in response order.
pub const REQUIRED_KEYS: [&str; 4] = ["streams", "colleges", "careers", "institutions"];

/// Keys every profile-mode pick carries.
pub const PICK_KEYS: [&str; 3] = ["college", "location", "reason"];

/// Why a parsed value cannot be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatch(pub String);

/// Completes a preference-mode recommendation.
///
/// The value must be a JSON object. Each missing required key is appended with
/// an empty array; present keys keep their value and position even if the value
/// is not an array.
pub fn complete_recommendations(value: Value) -> Result<Map<String, Value>, ShapeMismatch> {
    let mut record = match value {
        Value::Object(record) => record,
        other => {
            return Err(ShapeMismatch(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            )))
        }
    };

    for key in REQUIRED_KEYS {
        record
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
    }
    Ok(record)
}

/// Completes a profile-mode recommendation: an array of
/// `{college, location, reason}` objects. Missing pick keys become empty strings;
/// any element that is not an object fails the whole value.
pub fn complete_picks(value: Value) -> Result<Vec<Map<String, Value>>, ShapeMismatch> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ShapeMismatch(format!(
                "expected a JSON array, got {}",
                kind_of(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(mut pick) => {
                for key in PICK_KEYS {
                    pick.entry(key)
                        .or_insert_with(|| Value::String(String::new()));
                }
                Ok(pick)
            }
            other => Err(ShapeMismatch(format!(
                "expected element {idx} to be an object, got {}",
                kind_of(&other)
            ))),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(map: &Map<String, Value>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_empty_object_gains_all_required_keys() {
        let record = complete_recommendations(json!({})).unwrap();
        assert_eq!(keys(&record), REQUIRED_KEYS.to_vec());
        for key in REQUIRED_KEYS {
            assert_eq!(record[key], json!([]));
        }
    }

    #[test]
    fn test_present_keys_are_not_overwritten_or_reordered() {
        let input = json!({
            "institutions": ["IIT Delhi"],
            "summary": "extra field kept",
            "streams": "not even an array"
        });
        let record = complete_recommendations(input).unwrap();
        assert_eq!(
            keys(&record),
            vec!["institutions", "summary", "streams", "colleges", "careers"]
        );
        assert_eq!(record["institutions"], json!(["IIT Delhi"]));
        assert_eq!(record["streams"], json!("not even an array"));
        assert_eq!(record["summary"], json!("extra field kept"));
        assert_eq!(record["colleges"], json!([]));
    }

    #[test]
    fn test_null_value_for_present_key_is_left_untouched() {
        let record = complete_recommendations(json!({"careers": null})).unwrap();
        assert_eq!(record["careers"], Value::Null);
    }

    #[test]
    fn test_wrong_top_level_kind_is_rejected() {
        for value in [json!([]), json!("text"), json!(7), Value::Null] {
            assert!(complete_recommendations(value).is_err());
        }
    }

    #[test]
    fn test_picks_gain_missing_keys() {
        let picks = complete_picks(json!([
            {"college": "IIT Delhi", "reason": "Top CS"},
            {}
        ]))
        .unwrap();
        assert_eq!(picks.len(), 2);
        assert_eq!(picks[0]["college"], "IIT Delhi");
        assert_eq!(picks[0]["location"], "");
        assert_eq!(keys(&picks[1]), PICK_KEYS.to_vec());
    }

    #[test]
    fn test_empty_pick_list_is_valid() {
        assert!(complete_picks(json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_picks_reject_non_object_elements_and_wrong_kind() {
        let err = complete_picks(json!([{"college": "X"}, "Y"])).unwrap_err();
        assert!(err.0.contains("element 1"));
        assert!(complete_picks(json!({"college": "X"})).is_err());
    }
}
