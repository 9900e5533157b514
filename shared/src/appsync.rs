use crate::error::LearningError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Direct-resolver payload forwarded by the AppSync request mapping.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppSyncEvent {
    pub parent_type_name: String,
    pub field_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl AppSyncEvent {
    pub fn arguments<T: DeserializeOwned>(&self) -> Result<T, LearningError> {
        Ok(serde_json::from_value(self.arguments.clone())?)
    }

    /// Reads `arguments.input`, the wrapper used by upsert mutations.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, LearningError> {
        let input = self
            .arguments
            .get("input")
            .cloned()
            .ok_or_else(|| LearningError::InvalidArguments("input field is missing".to_string()))?;
        Ok(serde_json::from_value(input)?)
    }
}

/// Serializes a resolver result.
pub fn to_response<T: Serialize>(value: &T) -> Result<serde_json::Value, LearningError> {
    serde_json::to_value(value).map_err(|e| LearningError::Encode(e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Course;

    #[test]
    fn input_wrapper_is_unpacked() {
        let event: AppSyncEvent = serde_json::from_value(serde_json::json!({
            "parentTypeName": "Mutation",
            "fieldName": "upsertCourse",
            "arguments": {"input": {"id": "c1", "url": "https://a"}}
        }))
        .unwrap();
        let course: Course = event.input().unwrap();
        assert_eq!(course.id, "c1");
    }

    #[test]
    fn missing_input_is_rejected() {
        let event: AppSyncEvent = serde_json::from_value(serde_json::json!({
            "parentTypeName": "Mutation",
            "fieldName": "upsertRoadmap"
        }))
        .unwrap();
        let err = event.input::<Course>().unwrap_err();
        assert!(matches!(err, LearningError::InvalidArguments(_)));
    }
}
