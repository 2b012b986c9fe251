/// Accented letters kept inside tokens alongside `[a-z0-9]`.
pub const ALLOWED_ACCENTS: &str = "çëäöüõßÿğşžŭėàáâîíìéêôûùỳśčńřť";

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ALLOWED_ACCENTS.contains(ch)
}

/// Lowercases, turns every run of disallowed characters into a separator and
/// splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in lowered.chars() {
        if is_token_char(ch) {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Splits on runs of `.`, `!`, `?` and line breaks, dropping blank pieces.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Sum over query tokens of how many haystack tokens contain them.
pub fn containment_score(haystack: &[String], query_tokens: &[String]) -> usize {
    query_tokens
        .iter()
        .map(|needle| {
            haystack
                .iter()
                .filter(|token| token.contains(needle.as_str()))
                .count()
        })
        .sum()
}
