//! JSON export of decoded trees.
//!
//! Lossy in one direction only: blobs become hex strings and localized
//! strings become objects, but every field and value is represented. Used by
//! the CLI `dump` command for inspection and diffing.

use serde_json::{json, Map, Value as Json};

use crate::value::{GffStruct, Value};

impl GffStruct {
    /// Convert the tree to a JSON value.
    ///
    /// Duplicate labels within one struct are disambiguated with a numeric
    /// suffix so no field is lost.
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        map.insert("_type".to_string(), json!(self.type_id));
        for field in &self.fields {
            let mut key = field.label.as_str().to_string();
            let mut n = 1;
            while map.contains_key(&key) {
                key = format!("{}#{n}", field.label.as_str());
                n += 1;
            }
            map.insert(key, value_to_json(&field.value));
        }
        Json::Object(map)
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Byte(v) => json!(v),
        Value::Char(v) => json!(v),
        Value::Word(v) => json!(v),
        Value::Short(v) => json!(v),
        Value::Dword(v) => json!(v),
        Value::Int(v) => json!(v),
        Value::Dword64(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::String(v) => json!(v),
        Value::ResRef(v) => json!(v.as_str()),
        Value::LocString(v) => {
            let variants: Vec<Json> = v
                .variants
                .iter()
                .map(|s| json!({ "language": s.language, "text": s.text }))
                .collect();
            json!({ "string_ref": v.string_ref, "variants": variants })
        }
        Value::Blob(v) => {
            let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
            json!(hex)
        }
        Value::Struct(v) => v.to_json(),
        Value::List(v) => Json::Array(v.iter().map(GffStruct::to_json).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::LocString;

    #[test]
    fn test_struct_to_json() {
        let s = GffStruct::new()
            .with("Tag", Value::String("door".into()))
            .unwrap()
            .with("Text", Value::LocString(LocString::inline(0, "Locked.")))
            .unwrap()
            .with("Data", Value::Blob(vec![0xDE, 0xAD]))
            .unwrap();

        let j = s.to_json();
        assert_eq!(j["Tag"], "door");
        assert_eq!(j["Text"]["variants"][0]["text"], "Locked.");
        assert_eq!(j["Data"], "dead");
    }

    #[test]
    fn test_duplicate_labels_are_kept() {
        let s = GffStruct::new()
            .with("Key", Value::Dword(1))
            .unwrap()
            .with("Key", Value::Dword(2))
            .unwrap();

        let j = s.to_json();
        assert_eq!(j["Key"], 1);
        assert_eq!(j["Key#1"], 2);
    }
}
