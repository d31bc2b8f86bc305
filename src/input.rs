//! Serde helpers for free-text request fields.

use serde::{Deserialize, Deserializer};

/// Strips surrounding whitespace so length validation sees the stored value.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

/// Like [`trimmed`], with blank text read as absent.
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Form {
        #[serde(deserialize_with = "trimmed")]
        name: String,
        #[serde(default, deserialize_with = "trimmed_opt")]
        note: Option<String>,
    }

    #[test]
    fn test_trims_text() {
        let form: Form = serde_json::from_str(r#"{"name": "  Groceries ", "note": " milk "}"#).unwrap();
        assert_eq!(form.name, "Groceries");
        assert_eq!(form.note.as_deref(), Some("milk"));
    }

    #[test]
    fn test_blank_optional_text_is_absent() {
        let form: Form = serde_json::from_str(r#"{"name": "   ", "note": "  "}"#).unwrap();
        assert_eq!(form.name, "");
        assert_eq!(form.note, None);

        let form: Form = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(form.note, None);
    }
}
