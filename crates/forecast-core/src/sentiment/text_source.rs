//! Text providers for entity-level scoring

/// Produces text to score for an entity such as a ticker symbol
#[cfg_attr(test, mockall::automock)]
pub trait TextSource: Send + Sync {
    fn text_for(&self, entity: &str) -> String;
}

/// Synthesises a fixed proxy sentence mentioning the entity
///
/// Used when no news feed is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxySentenceSource;

impl TextSource for ProxySentenceSource {
    fn text_for(&self, entity: &str) -> String {
        format!("Recent financial news about {entity} stock performance and market outlook.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_sentence() {
        assert_eq!(
            ProxySentenceSource.text_for("AMZN"),
            "Recent financial news about AMZN stock performance and market outlook."
        );
    }
}
