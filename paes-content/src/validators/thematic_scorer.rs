//! Thematic Coherence Scorer
//!
//! Scores a content node's free text against every subject lexicon in the
//! catalog and reports how well the declared subject agrees with the text.
//!
//! # Scoring Algorithm
//! Text is `title + " " + description`, lower-cased. For each keyword:
//! - whole-word occurrence (both neighbours non-alphanumeric or text
//!   boundary): `weight × 2.0`
//! - substring-only occurrence: `weight × 0.5`
//! - absent: 0
//!
//! The subject with the highest total is suggested (ties go to the earlier
//! subject in catalog order). Confidence is `declared / max`, clamped to
//! [0, 1], and 1.0 when no subject scores above zero.

use paes_common::catalog::Keyword;
use paes_common::{Catalog, ContentNode, Subject};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const WHOLE_WORD_FACTOR: f64 = 2.0;
const SUBSTRING_FACTOR: f64 = 0.5;

/// Result of scoring one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThematicScore {
    /// Score per subject, all five present
    pub scores: BTreeMap<Subject, f64>,
    /// Best-scoring subject; `None` when the text carries no keyword signal
    pub suggested_subject: Option<Subject>,
    pub max_score: f64,
    pub declared_score: f64,
    pub confidence: f64,
}

/// Pure keyword scorer over the catalog lexicon
#[derive(Debug, Clone)]
pub struct ThematicScorer {
    catalog: Arc<Catalog>,
}

impl ThematicScorer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Per-subject scores for arbitrary text
    pub fn score_text(&self, text: &str) -> BTreeMap<Subject, f64> {
        let text = text.to_lowercase();
        Subject::ALL
            .iter()
            .map(|&subject| (subject, lexicon_score(&text, self.catalog.keywords(subject))))
            .collect()
    }

    /// Score a node against its declared subject
    pub fn score(&self, node: &ContentNode) -> ThematicScore {
        let text = format!("{} {}", node.title, node.description);
        let scores = self.score_text(&text);

        let mut suggested_subject = None;
        let mut max_score = 0.0_f64;
        for subject in Subject::ALL {
            let score = scores.get(&subject).copied().unwrap_or(0.0);
            if score > max_score {
                max_score = score;
                suggested_subject = Some(subject);
            }
        }

        let declared_score = node
            .subject_category
            .and_then(|s| scores.get(&s).copied())
            .unwrap_or(0.0);

        let confidence = if max_score > 0.0 {
            (declared_score / max_score).clamp(0.0, 1.0)
        } else {
            1.0
        };

        ThematicScore {
            scores,
            suggested_subject,
            max_score,
            declared_score,
            confidence,
        }
    }
}

fn lexicon_score(text: &str, keywords: &[Keyword]) -> f64 {
    keywords
        .iter()
        .map(|k| match find_match(text, &k.term) {
            Match::WholeWord => k.weight * WHOLE_WORD_FACTOR,
            Match::Substring => k.weight * SUBSTRING_FACTOR,
            Match::None => 0.0,
        })
        .sum()
}

#[derive(Debug, PartialEq)]
enum Match {
    WholeWord,
    Substring,
    None,
}

/// Best match of `term` in `text` (both already lower-cased)
fn find_match(text: &str, term: &str) -> Match {
    if term.is_empty() {
        return Match::None;
    }
    let mut found = Match::None;
    for (start, matched) in text.match_indices(term) {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        let bounded = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric());
        if bounded(before) && bounded(after) {
            return Match::WholeWord;
        }
        found = Match::Substring;
    }
    found
}
