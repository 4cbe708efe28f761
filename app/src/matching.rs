use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::catalog::CandidatePackage;
use crate::config::MatchingConfig;

/// The slice of an SCCM application the engine scores against the catalog.
#[derive(Debug, Clone, Copy)]
pub struct AppFacts<'a> {
    pub name: &'a str,
    pub manufacturer: Option<&'a str>,
    pub version: Option<&'a str>,
}

/// One retained partial-match candidate, as persisted in the
/// `match_candidates` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub package_id: String,
    pub package_name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Matched,
    Partial,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub classification: Classification,
    /// Best-candidate confidence; None when the search produced nothing.
    pub confidence: Option<f64>,
    /// The single winning package, present only for Matched.
    pub best: Option<CandidatePackage>,
    /// Top-N candidates by descending confidence, present only for Partial.
    pub alternates: Vec<MatchCandidate>,
}

struct Scored {
    package: CandidatePackage,
    confidence: f64,
    publisher_score: f64,
}

/// Pure multi-signal match over a candidate set the caller obtained from the
/// catalog's indexed search. Deterministic: identical inputs produce identical
/// scores and ordering.
pub fn match_application(
    facts: &AppFacts<'_>,
    candidates: &[CandidatePackage],
    config: &MatchingConfig,
) -> MatchOutcome {
    let mut scored: Vec<Scored> = candidates
        .iter()
        .map(|candidate| score_candidate(facts, candidate, config))
        .collect();

    // Ordering must be reproducible: confidence, then publisher similarity,
    // then shorter package id, then the id itself.
    scored.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(b.publisher_score.total_cmp(&a.publisher_score))
            .then(a.package.id.len().cmp(&b.package.id.len()))
            .then(a.package.id.cmp(&b.package.id))
    });

    let Some(top) = scored.first() else {
        return MatchOutcome {
            classification: Classification::Unmatched,
            confidence: None,
            best: None,
            alternates: vec![],
        };
    };

    let confidence = top.confidence;

    match classify(confidence, config) {
        Classification::Matched => MatchOutcome {
            classification: Classification::Matched,
            confidence: Some(confidence),
            best: Some(top.package.clone()),
            alternates: vec![],
        },
        Classification::Partial => MatchOutcome {
            classification: Classification::Partial,
            confidence: Some(confidence),
            best: None,
            alternates: scored
                .iter()
                .take(config.max_alternates())
                .map(|entry| MatchCandidate {
                    package_id: entry.package.id.clone(),
                    package_name: entry.package.name.clone(),
                    confidence: entry.confidence,
                })
                .collect(),
        },
        Classification::Unmatched => MatchOutcome {
            classification: Classification::Unmatched,
            confidence: Some(confidence),
            best: None,
            alternates: vec![],
        },
    }
}

/// Boundary is inclusive on the matched side: confidence exactly at the high
/// threshold classifies as Matched.
pub fn classify(confidence: f64, config: &MatchingConfig) -> Classification {
    if confidence >= config.high_threshold() {
        Classification::Matched
    } else if confidence >= config.low_threshold() {
        Classification::Partial
    } else {
        Classification::Unmatched
    }
}

fn score_candidate(
    facts: &AppFacts<'_>,
    candidate: &CandidatePackage,
    config: &MatchingConfig,
) -> Scored {
    let app_name = normalize_name(facts.name);
    let candidate_name = normalize_name(&candidate.name);

    let name_score =
        0.6 * jaro_winkler(&app_name, &candidate_name) + 0.4 * token_overlap(&app_name, &candidate_name);

    let publisher_score = match (facts.manufacturer, candidate.publisher.as_deref()) {
        (Some(manufacturer), Some(publisher)) => Some(jaro_winkler(
            &normalize_publisher(manufacturer),
            &normalize_publisher(publisher),
        )),
        _ => None,
    };

    let version_score = match (facts.version, candidate.version.as_deref()) {
        (Some(left), Some(right)) => version_proximity(left, right),
        _ => 0.0,
    };

    // When neither side exposes a comparable publisher, the name signal
    // absorbs the publisher weight so a lone exact name can still clear the
    // high threshold.
    let confidence = match publisher_score {
        Some(publisher) => {
            name_score * config.name_weight()
                + publisher * config.publisher_weight()
                + version_score * config.version_bonus()
        }
        None => {
            name_score * (config.name_weight() + config.publisher_weight())
                + version_score * config.version_bonus()
        }
    };

    Scored {
        package: candidate.clone(),
        confidence: confidence.min(1.0),
        publisher_score: publisher_score.unwrap_or(0.0),
    }
}

const NOISE_TOKENS: &[&str] = &[
    "x64", "x86", "amd64", "arm64", "win64", "win32", "64bit", "32bit", "bit", "mui",
    "multilanguage", "edition", "setup", "installer",
];

/// Lowercases and drops architecture/locale noise and embedded version
/// tokens, so "Google Chrome (x64) 120.0" and "Google Chrome" compare equal.
/// Dotted versions are checked against the whole word, before punctuation
/// splits them into harmless digit runs.
pub fn normalize_name(raw: &str) -> String {
    let mut tokens = Vec::new();

    for word in raw.split_whitespace() {
        let stripped = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_ascii_lowercase();
        if is_version_token(&stripped) {
            continue;
        }

        for token in word.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let token = token.to_ascii_lowercase();
            if NOISE_TOKENS.contains(&token.as_str()) || is_version_token(&token) {
                continue;
            }
            tokens.push(token);
        }
    }

    tokens.join(" ")
}

/// Lowercases and drops corporate suffixes: "Google LLC" and "Google" match.
pub fn normalize_publisher(raw: &str) -> String {
    const SUFFIXES: &[&str] = &[
        "inc", "llc", "ltd", "limited", "corp", "corporation", "co", "gmbh", "sa", "srl", "ag",
    ];

    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .filter(|token| !SUFFIXES.contains(&token.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// "v3", "1.2.3" and similar. Bare short numbers are kept so names like
/// "7-Zip" survive normalization.
fn is_version_token(token: &str) -> bool {
    if let Some(rest) = token.strip_prefix('v') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }

    token.contains('.') && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn token_overlap(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();

    intersection as f64 / union as f64
}

/// 1.0 for equal parsed versions, 0.5 for a shared leading segment, else 0.
fn version_proximity(left: &str, right: &str) -> f64 {
    let left_parts = parse_version(left);
    let right_parts = parse_version(right);

    if left_parts.is_empty() || right_parts.is_empty() {
        return 0.0;
    }

    if left_parts == right_parts {
        return 1.0;
    }

    if left_parts.first() == right_parts.first() {
        return 0.5;
    }

    0.0
}

fn parse_version(raw: &str) -> Vec<u64> {
    raw.trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .split('.')
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}
