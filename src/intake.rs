//! Free-text post parsing into job-creation requests.
//!
//! Marketplace posts arrive as unstructured text ("design me a logo, $25
//! #design"). [`PostParser`] extracts the reward, collects tags, and builds a
//! clean title. A post without an extractable reward is not a job.

use crate::marketplace::NewJobRequest;

/// Rewards outside this range are treated as noise, not postings.
pub const MIN_REWARD_USD: f64 = 1.0;
pub const MAX_REWARD_USD: f64 = 1000.0;

const MAX_TITLE_LEN: usize = 100;

/// Currency words recognized after a bare amount ("5 USDT").
const CURRENCY_WORDS: &[&str] = &["usd", "usdt", "usdc", "cusd"];

/// Filler words stripped when building a title.
const FILLER_WORDS: &[&str] = &["pay", "paying", "budget", "reward"];

/// Keyword-driven tag detection, checked against the lowercased text.
const AUTO_TAGS: &[(&str, &[&str])] = &[
    ("design", &["logo", "design", "graphic", "ui", "ux", "banner", "icon"]),
    (
        "code",
        &["code", "develop", "build", "program", "smart contract", "solidity", "typescript", "api"],
    ),
    ("writing", &["write", "blog", "article", "copy", "content"]),
    ("translation", &["translat", "spanish", "english", "french"]),
    ("audit", &["audit", "review", "security"]),
    ("research", &["research", "analyze", "report"]),
];

pub struct PostParser;

impl PostParser {
    /// Parse free-form post text into a job-creation request.
    ///
    /// Returns `None` when no reward in the accepted range is present.
    pub fn parse(text: &str, poster: &str, source_url: Option<String>) -> Option<NewJobRequest> {
        let text = strip_mentions(text);
        let amount = extract_reward(&text)?;
        if !(MIN_REWARD_USD..=MAX_REWARD_USD).contains(&amount) {
            return None;
        }

        let mut title = build_title(&text);
        if title.len() < 3 {
            title = "Task from post".to_string();
        }

        Some(NewJobRequest {
            title,
            description: text.trim().to_string(),
            reward: format!("{amount} USDT"),
            poster: poster.to_string(),
            poster_address: None,
            tags: extract_tags(&text),
            source_url,
        })
    }
}

fn strip_mentions(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !word.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find a reward amount: "$25" / "$7.50" first, then "25 USDT"-style pairs.
fn extract_reward(text: &str) -> Option<f64> {
    let words: Vec<&str> = text.split_whitespace().collect();

    for (i, word) in words.iter().enumerate() {
        if let Some(rest) = word.strip_prefix('$')
            && let Some(amount) = parse_amount(rest)
        {
            return Some(amount);
        }
        if let Some(amount) = parse_amount(word)
            && let Some(next) = words.get(i + 1)
            && CURRENCY_WORDS.contains(&trim_punctuation(next).to_lowercase().as_str())
        {
            return Some(amount);
        }
    }
    None
}

fn parse_amount(word: &str) -> Option<f64> {
    let cleaned = trim_punctuation(word);
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    cleaned.parse().ok()
}

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
        .trim_end_matches('.')
}

/// Hashtags plus keyword-detected tags, hashtags first, no duplicates.
fn extract_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = text
        .split_whitespace()
        .filter_map(|word| word.strip_prefix('#'))
        .map(|tag| trim_punctuation(tag).to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    let lower = text.to_lowercase();
    for &(tag, keywords) in AUTO_TAGS {
        if keywords.iter().any(|kw| lower.contains(kw)) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Drop reward tokens, hashtags, and filler words; collapse whitespace;
/// truncate to a readable length.
fn build_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::new();

    let mut skip_next = false;
    for (i, word) in words.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if word.starts_with('#') || word.starts_with('$') && parse_amount(&word[1..]).is_some() {
            continue;
        }
        if parse_amount(word).is_some()
            && let Some(next) = words.get(i + 1)
            && CURRENCY_WORDS.contains(&trim_punctuation(next).to_lowercase().as_str())
        {
            skip_next = true;
            continue;
        }
        if FILLER_WORDS.contains(&trim_punctuation(word).to_lowercase().as_str()) {
            continue;
        }
        kept.push(word);
    }

    let mut title = kept.join(" ").trim().to_string();
    if title.len() > MAX_TITLE_LEN {
        let cut = title
            .char_indices()
            .take_while(|(i, _)| *i <= MAX_TITLE_LEN - 3)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        title.truncate(cut);
        title.push_str("...");
    }
    title
}
