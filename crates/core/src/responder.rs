use crate::tokens::{containment_score, split_sentences, tokenize};
use crate::{ChatError, PageEntry, ReplyRules, SearchResult};
use regex::Regex;

/// Finds the page that best overlaps the query and the best sentence within it.
///
/// Pages score the sum, over query tokens, of page tokens containing that token.
/// The first page with the strictly highest non-zero score wins.
pub fn search(index: &[PageEntry], query: &str) -> Option<SearchResult> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return None;
    }

    let mut best: Option<&PageEntry> = None;
    let mut best_score = 0;
    for page in index {
        let score = containment_score(&page.tokens, &query_tokens);
        if score > best_score {
            best_score = score;
            best = Some(page);
        }
    }

    let page = best?;
    Some(SearchResult {
        page: page.clone(),
        snippet: best_sentence(&page.text, &query_tokens),
        score: best_score,
    })
}

fn best_sentence(text: &str, query_tokens: &[String]) -> String {
    let sentences = split_sentences(text);
    let mut chosen = sentences.first().copied().unwrap_or(text);
    let mut chosen_score = 0;

    for sentence in sentences {
        let score = containment_score(&tokenize(sentence), query_tokens);
        if score > chosen_score {
            chosen_score = score;
            chosen = sentence;
        }
    }

    chosen.to_string()
}

pub fn compose_reply(result: &SearchResult) -> String {
    format!("{} — Më shumë: {}", result.snippet, result.page.url)
}

/// Rule-based replies used when the site index has nothing to offer.
#[derive(Debug, Clone)]
pub struct Responder {
    clarification: String,
    fallback: String,
    topics: Vec<(Regex, String)>,
}

impl Responder {
    pub fn new(rules: &ReplyRules) -> Result<Self, ChatError> {
        let topics = rules
            .topics
            .iter()
            .map(|(pattern, reply)| Ok((Regex::new(pattern)?, reply.to_string())))
            .collect::<Result<Vec<_>, ChatError>>()?;

        Ok(Self {
            clarification: rules.clarification.to_string(),
            fallback: rules.fallback.to_string(),
            topics,
        })
    }

    pub fn decide_reply(&self, text: &str) -> &str {
        if text.trim().is_empty() {
            return &self.clarification;
        }

        let lowered = text.to_lowercase();
        self.topics
            .iter()
            .find(|(pattern, _)| pattern.is_match(&lowered))
            .map(|(_, reply)| reply.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Site-aware answer first, canned reply second.
    pub fn answer(&self, index: &[PageEntry], text: &str) -> String {
        match search(index, text) {
            Some(found) => compose_reply(&found),
            None => self.decide_reply(text).to_string(),
        }
    }
}
