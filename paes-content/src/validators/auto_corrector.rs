//! Auto-Corrector
//!
//! Applies the three deterministic metadata fixes to a single node:
//! 1. subject differs from the canonical subject of `test_id` → canonical
//! 2. cognitive level missing → `COMPRENDER`
//! 3. skill not in the allow-list of `test_id` → first allowed skill
//!
//! The fixes are independent of each other, so the result is idempotent.
//! Nodes whose `test_id` has no catalog entry keep their subject and skill.

use paes_common::{Catalog, CognitiveLevel, ContentNode};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectedField {
    SubjectCategory,
    CognitiveLevel,
    SkillId,
}

/// One applied fix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub field: CorrectedField,
    pub from: Option<String>,
    pub to: String,
}

/// Corrected copy of a node plus what changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionOutcome {
    pub node: ContentNode,
    pub corrections: Vec<Correction>,
}

impl CorrectionOutcome {
    pub fn changed(&self) -> bool {
        !self.corrections.is_empty()
    }
}

pub struct AutoCorrector {
    catalog: Arc<Catalog>,
}

impl AutoCorrector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Return a corrected copy of `node`; the input is left untouched
    pub fn correct(&self, node: &ContentNode) -> CorrectionOutcome {
        let mut corrected = node.clone();
        let mut corrections = Vec::new();

        if let Some(canonical) = self.catalog.canonical_subject(node.test_id) {
            if node.subject_category != Some(canonical) {
                corrected.subject_category = Some(canonical);
                corrections.push(Correction {
                    field: CorrectedField::SubjectCategory,
                    from: node.subject_category.map(|s| s.to_string()),
                    to: canonical.to_string(),
                });
            }
        }

        if node.cognitive_level.is_none() {
            corrected.cognitive_level = Some(CognitiveLevel::DEFAULT);
            corrections.push(Correction {
                field: CorrectedField::CognitiveLevel,
                from: None,
                to: CognitiveLevel::DEFAULT.to_string(),
            });
        }

        if !self.catalog.is_skill_allowed(node.test_id, node.skill_id) {
            if let Some(skill) = self.catalog.default_skill(node.test_id) {
                corrected.skill_id = skill;
                corrections.push(Correction {
                    field: CorrectedField::SkillId,
                    from: Some(node.skill_id.to_string()),
                    to: skill.to_string(),
                });
            }
        }

        for correction in &corrections {
            info!(
                node_id = %node.id,
                field = ?correction.field,
                from = correction.from.as_deref().unwrap_or("none"),
                to = %correction.to,
                "Auto-corrected node"
            );
        }

        CorrectionOutcome {
            node: corrected,
            corrections,
        }
    }
}
