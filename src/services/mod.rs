//! Orchestration services: the layer between validated requests and
//! providers. Services assume input is already valid, never retry, and
//! never translate errors.
mod chat;
mod embeddings;

pub use chat::ChatService;
pub use embeddings::EmbeddingsService;

/// Latencies are reported with 2 decimal places.
pub(crate) fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round_ms;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_ms(12.3456), 12.35);
        assert_eq!(round_ms(12.344), 12.34);
        assert_eq!(round_ms(0.0), 0.0);
        // Idempotent: already-rounded values pass through.
        assert_eq!(round_ms(round_ms(7.777)), round_ms(7.777));
    }
}
