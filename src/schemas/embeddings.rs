//! Request and response contracts for `POST /v1/embeddings`.
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A single string or a batch of strings. Normalization always produces a
/// sequence, so downstream code never branches on shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingInput {
    /// Number of strings after normalization.
    pub fn len(&self) -> usize {
        match self {
            EmbeddingInput::Single(_) => 1,
            EmbeddingInput::Batch(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap a single string into a one-element sequence; pass batches through.
    pub fn into_inputs(self) -> Vec<String> {
        match self {
            EmbeddingInput::Single(text) => vec![text],
            EmbeddingInput::Batch(items) => items,
        }
    }
}

/// Request contract for `POST /v1/embeddings`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingsRequest {
    #[validate(custom(function = validate_input_not_empty))]
    pub input: EmbeddingInput,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
}

fn validate_input_not_empty(input: &EmbeddingInput) -> Result<(), ValidationError> {
    if input.is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("input must contain at least one string".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingsUsage {
    pub total_tokens: Option<u64>,
}

/// One float vector per normalized input string, order preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f64>>,
    pub model: String,
    pub latency_ms: f64,
    pub request_id: String,
    pub usage: Option<EmbeddingsUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_string_normalizes_to_one_element() {
        let input: EmbeddingInput = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input.into_inputs(), vec!["hello".to_string()]);
    }

    #[test]
    fn batch_preserves_order() {
        let input: EmbeddingInput = serde_json::from_value(json!(["a", "b", "c"])).unwrap();
        assert_eq!(
            input.into_inputs(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn empty_batch_rejected() {
        let request: EmbeddingsRequest =
            serde_json::from_value(json!({"input": [], "model": "m"})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn model_is_optional() {
        let request: EmbeddingsRequest =
            serde_json::from_value(json!({"input": "hello"})).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.model, None);
    }

    #[test]
    fn oversize_model_rejected() {
        let request: EmbeddingsRequest =
            serde_json::from_value(json!({"input": "x", "model": "m".repeat(101)})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn unknown_fields_rejected_at_deserialization() {
        let body = json!({"input": "x", "model": "m", "dimensions": 8});
        assert!(serde_json::from_value::<EmbeddingsRequest>(body).is_err());
    }
}
