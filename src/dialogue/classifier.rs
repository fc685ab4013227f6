//! Keyword classification of user utterances
//!
//! Categories are tried in a fixed priority order and the first one with a
//! keyword contained in the utterance wins. Matching is a plain,
//! case-sensitive substring test with no normalization.

use super::config::CategoryKeywords;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCategory {
    Interest,
    Busy,
    Price,
    Quality,
    Default,
}

impl ResponseCategory {
    /// Keyword categories in match order
    pub const PRIORITY: [ResponseCategory; 4] = [
        ResponseCategory::Interest,
        ResponseCategory::Busy,
        ResponseCategory::Price,
        ResponseCategory::Quality,
    ];

    pub const ALL: [ResponseCategory; 5] = [
        ResponseCategory::Interest,
        ResponseCategory::Busy,
        ResponseCategory::Price,
        ResponseCategory::Quality,
        ResponseCategory::Default,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResponseCategory::Interest => "interest",
            ResponseCategory::Busy => "busy",
            ResponseCategory::Price => "price",
            ResponseCategory::Quality => "quality",
            ResponseCategory::Default => "default",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    rules: Vec<(ResponseCategory, Vec<String>)>,
}

impl ResponseClassifier {
    pub fn new(keywords: &CategoryKeywords) -> Self {
        let rules = ResponseCategory::PRIORITY
            .iter()
            .map(|&category| (category, keywords.for_category(category).to_vec()))
            .collect();
        Self { rules }
    }

    pub fn classify(&self, utterance: &str) -> ResponseCategory {
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| utterance.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(ResponseCategory::Default)
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(&CategoryKeywords::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> ResponseClassifier {
        ResponseClassifier::new(&CategoryKeywords {
            interest: vec!["interested".into(), "sample".into()],
            busy: vec!["busy".into(), "hurry".into()],
            price: vec!["how much".into(), "price".into()],
            quality: vec!["rice".into(), "taste".into()],
        })
    }

    #[test]
    fn test_each_category() {
        let c = english();
        assert_eq!(c.classify("I'm interested"), ResponseCategory::Interest);
        assert_eq!(c.classify("sorry, busy now"), ResponseCategory::Busy);
        assert_eq!(c.classify("how much?"), ResponseCategory::Price);
        assert_eq!(c.classify("does it taste good"), ResponseCategory::Quality);
        assert_eq!(c.classify("hello there"), ResponseCategory::Default);
    }

    #[test]
    fn test_priority_beats_position() {
        let c = english();
        // "price" appears first in the text, but busy outranks price
        assert_eq!(c.classify("price? I'm busy"), ResponseCategory::Busy);
        assert_eq!(c.classify("rice price"), ResponseCategory::Price);
        assert_eq!(c.classify("rice sample, busy"), ResponseCategory::Interest);
    }

    #[test]
    fn test_case_sensitive() {
        let c = english();
        assert_eq!(c.classify("BUSY"), ResponseCategory::Default);
    }

    #[test]
    fn test_default_japanese_keywords() {
        let c = ResponseClassifier::default();
        assert_eq!(c.classify("サンプルが欲しいです"), ResponseCategory::Interest);
        assert_eq!(c.classify("今は忙しいので"), ResponseCategory::Busy);
        assert_eq!(c.classify("いくらですか"), ResponseCategory::Price);
        assert_eq!(c.classify("お米の味は"), ResponseCategory::Quality);
        assert_eq!(c.classify("はい"), ResponseCategory::Default);
        // 時間 (busy) wins over 値段 (price)
        assert_eq!(c.classify("値段を聞く時間はない"), ResponseCategory::Busy);
    }

    #[test]
    fn test_empty_utterance_is_default() {
        assert_eq!(english().classify(""), ResponseCategory::Default);
    }
}
