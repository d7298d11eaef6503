// src/quality.rs
//! Quality gate: deterministic heuristics over `(title, content)`.
//!
//! Three independent checks (clickbait, minimum word count, press-release
//! boilerplate) combined into an additive 0-100 score. The gate decides
//! the post-extraction lifecycle: low quality blocks, otherwise processed.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::QualityCfg;

/// Phrases that mark a teaser headline. Matched exact or fuzzy
/// (Jaro-Winkler over same-length word windows) to catch minor variants.
const CLICKBAIT_PHRASES: &[&str] = &[
    "you won't believe",
    "what happens next",
    "will shock you",
    "this one trick",
    "one weird trick",
    "doctors hate",
    "jaw dropping",
    "mind blowing",
    "can't stop watching",
    "the real reason",
    "you need to know",
    "went viral",
    "restore your faith in humanity",
];

const FUZZY_PHRASE_THRESHOLD: f64 = 0.93;

/// Wire-service and boilerplate markers; two or more hits make a press
/// release.
const PRESS_RELEASE_MARKERS: &[&str] = &[
    "prnewswire",
    "pr newswire",
    "businesswire",
    "business wire",
    "globe newswire",
    "globenewswire",
    "accesswire",
    "press release",
    "today announced",
    "announced today",
    "is pleased to announce",
    "is proud to announce",
    "forward-looking statements",
    "media contact",
    "press contact",
    "investor relations",
    "for more information, visit",
    "for more information visit",
];

static RE_LISTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^\d+\s+(things|ways|reasons|facts|secrets|tricks|signs|photos)\b|\btop\s+\d+\b)")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickbaitVerdict {
    pub flagged: bool,
    /// Penalty contribution toward the quality score.
    pub penalty: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub quality_score: i64,
    pub is_low_quality: bool,
}

fn tokenize_lower(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Does the title contain `phrase`, allowing near-miss spellings?
fn contains_phrase_fuzzy(title_tokens: &[String], phrase: &str) -> bool {
    let phrase_tokens: Vec<&str> = phrase.split_whitespace().collect();
    let n = phrase_tokens.len();
    if n == 0 || title_tokens.len() < n {
        return false;
    }
    let needle = phrase_tokens.join(" ");
    title_tokens.windows(n).any(|w| {
        let window = w.join(" ");
        window == needle || strsim::jaro_winkler(&window, &needle) >= FUZZY_PHRASE_THRESHOLD
    })
}

/// Heuristic clickbait scorer over the title.
pub fn clickbait_check(title: &str) -> ClickbaitVerdict {
    let tokens = tokenize_lower(title);
    let mut penalty = 0u32;

    if CLICKBAIT_PHRASES
        .iter()
        .any(|p| contains_phrase_fuzzy(&tokens, p))
    {
        penalty += 15;
    }

    if RE_LISTICLE.is_match(title) {
        penalty += 10;
    }

    if title.matches('!').count() >= 2 {
        penalty += 10;
    }

    // Shouty headlines: ratio of ALL-CAPS words among alphabetic words.
    let alpha_words: Vec<&str> = title
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphabetic()) && w.chars().count() >= 3)
        .collect();
    let caps = alpha_words
        .iter()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase()))
        .count();
    if caps >= 2 && !alpha_words.is_empty() && caps * 10 >= alpha_words.len() * 3 {
        penalty += 15;
    }

    // Second-person question hook ("Are you making these mistakes?").
    if title.trim_end().ends_with('?')
        && tokens.iter().any(|t| t == "you" || t == "your")
    {
        penalty += 10;
    }

    ClickbaitVerdict {
        flagged: penalty >= 25,
        penalty,
    }
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Press-release detection over title + content.
pub fn is_press_release(title: &str, content: &str) -> bool {
    let haystack = format!("{} {}", title, content).to_lowercase();
    let hits = PRESS_RELEASE_MARKERS
        .iter()
        .filter(|m| haystack.contains(*m))
        .count();
    hits >= 2
}

/// Grade one article. Penalties are additive and independent; an article
/// can lose points on all three axes at once.
pub fn grade(title: &str, content: &str, cfg: &QualityCfg) -> Grade {
    let clickbait = clickbait_check(title);
    let word_count_ok = word_count(content) >= cfg.min_word_count;
    let press_release = is_press_release(title, content);

    let mut score: i64 = 100;
    score -= clickbait.penalty as i64;
    if press_release {
        score -= 50;
    }
    if !word_count_ok {
        score -= 30;
    }

    Grade {
        quality_score: score.max(0),
        is_low_quality: clickbait.flagged || !word_count_ok || press_release,
    }
}
