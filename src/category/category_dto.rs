use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::input::{trimmed, trimmed_opt};

/// Body for both creating and updating a category.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default, deserialize_with = "trimmed_opt")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_fails_validation() {
        let request: CategoryRequest = serde_json::from_str(r#"{"name": "    "}"#).unwrap();
        assert!(request.validate().is_err());

        let request: CategoryRequest = serde_json::from_str(r#"{"name": " Work "}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.name, "Work");
    }
}
