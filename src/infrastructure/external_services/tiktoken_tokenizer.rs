use tiktoken_rs::CoreBPE;

use crate::application::ports::Tokenizer;

/// BPE token counts matching the embedding model's encoder.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    encoding: String,
}

impl TiktokenTokenizer {
    /// Picks the encoder registered for `model`, falling back to
    /// `cl100k_base` for models tiktoken does not know.
    pub fn for_model(model: &str) -> Result<Self, String> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self {
                bpe,
                encoding: format!("model:{}", model),
            }),
            Err(_) => {
                tracing::warn!(
                    "No tokenizer registered for model {}; using cl100k_base",
                    model
                );
                let bpe = tiktoken_rs::cl100k_base().map_err(|e| e.to_string())?;
                Ok(Self {
                    bpe,
                    encoding: "cl100k_base".to_string(),
                })
            }
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_models() {
        let known = TiktokenTokenizer::for_model("text-embedding-3-small").unwrap();
        assert_eq!(known.encoding(), "model:text-embedding-3-small");
        assert!(known.count("hello world") >= 2);

        let fallback = TiktokenTokenizer::for_model("house-embedder-v9").unwrap();
        assert_eq!(fallback.encoding(), "cl100k_base");
        assert_eq!(fallback.count(""), 0);
    }

    #[test]
    fn test_prefix_respects_budget() {
        let tokenizer = TiktokenTokenizer::for_model("text-embedding-3-small").unwrap();
        let text = "Clean the lobby floor every morning before opening. ".repeat(20);

        let cut = tokenizer.prefix_len(&text, 25);

        assert!(cut > 0 && cut < text.len());
        assert!(tokenizer.count(&text[..cut]) <= 25);
    }
}
