/// Ordered input history of one USSD session, as replayed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSequence {
    tokens: Vec<String>,
}

impl TokenSequence {
    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn newest(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// The first `depth` tokens, i.e. the history as it stood on an earlier callback.
    pub fn prefix(&self, depth: usize) -> TokenSequence {
        TokenSequence {
            tokens: self.tokens[..depth.min(self.tokens.len())].to_vec(),
        }
    }
}

/// Splits the accumulated `text` field on `*`. Empty segments are dropped so
/// `"1**2"` and `"1*2*"` both read as two tokens.
pub fn parse(raw_text: &str) -> TokenSequence {
    TokenSequence {
        tokens: raw_text
            .split('*')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
