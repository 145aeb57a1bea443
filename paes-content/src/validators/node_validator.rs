//! Node Integrity Validator
//!
//! Checks each content node against the catalog and the thematic scorer and
//! reports every violation as a [`ValidationIssue`] carrying its [`IssueKind`].
//!
//! # Validity Rule
//! A node is valid when all of the following hold:
//! 1. declared subject equals the canonical subject of `test_id`
//! 2. cognitive level is one of the six recognized values
//! 3. `skill_id` is in the allow-list for `test_id`
//! 4. the keyword signal is weak (`max_score < strong_signal_threshold`) or
//!    the declared subject is confirmed (`confidence > min_confidence`)
//!
//! `missing_content` (blank title and description) is reported but does not
//! affect validity.

use super::thematic_scorer::{ThematicScore, ThematicScorer};
use paes_common::config::CoherenceConfig;
use paes_common::{Catalog, ContentNode, Subject};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Issue classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ThematicMismatch,
    SkillMismatch,
    SubjectAreaMismatch,
    TestIdMismatch,
    CognitiveLevelMismatch,
    MissingContent,
}

impl IssueKind {
    pub const ALL: [IssueKind; 6] = [
        IssueKind::ThematicMismatch,
        IssueKind::SkillMismatch,
        IssueKind::SubjectAreaMismatch,
        IssueKind::TestIdMismatch,
        IssueKind::CognitiveLevelMismatch,
        IssueKind::MissingContent,
    ];

    /// Warnings are counted but never make a node invalid
    pub fn is_warning(&self) -> bool {
        matches!(self, IssueKind::MissingContent)
    }
}

/// One finding on one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub node_id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Per-node validation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeValidationResult {
    pub node_id: String,
    pub is_valid: bool,
    pub confidence: f64,
    pub suggested_test: Option<Subject>,
    pub scores: BTreeMap<Subject, f64>,
    pub issues: Vec<ValidationIssue>,
}

/// Aggregate over a node collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total_nodes: usize,
    /// Nodes with zero issues
    pub valid_nodes: usize,
    pub total_issues: usize,
    /// Every kind is present, zero counts included
    pub issues_by_type: BTreeMap<IssueKind, usize>,
    pub results: Vec<NodeValidationResult>,
}

/// Node Integrity Validator
pub struct NodeValidator {
    catalog: Arc<Catalog>,
    scorer: ThematicScorer,
    strong_signal_threshold: f64,
    min_confidence: f64,
}

impl NodeValidator {
    /// Create validator with default thresholds
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, CoherenceConfig::default())
    }

    /// Create validator with configured thresholds
    pub fn with_config(catalog: Arc<Catalog>, config: CoherenceConfig) -> Self {
        Self {
            scorer: ThematicScorer::new(Arc::clone(&catalog)),
            catalog,
            strong_signal_threshold: config.strong_signal_threshold,
            min_confidence: config.min_confidence,
        }
    }

    /// Validate one node
    pub fn validate_node(&self, node: &ContentNode) -> NodeValidationResult {
        let score = self.scorer.score(node);
        let mut issues = Vec::new();

        self.check_subject(node, &mut issues);
        self.check_cognitive_level(node, &mut issues);
        self.check_skill(node, &mut issues);
        self.check_thematic(node, &score, &mut issues);
        check_content(node, &mut issues);

        let is_valid = issues.iter().all(|i| i.kind.is_warning());

        debug!(
            node_id = %node.id,
            is_valid,
            confidence = score.confidence,
            max_score = score.max_score,
            issues = issues.len(),
            "Node validated"
        );

        NodeValidationResult {
            node_id: node.id.clone(),
            is_valid,
            confidence: score.confidence,
            suggested_test: score.suggested_subject,
            scores: score.scores,
            issues,
        }
    }

    /// Validate a node collection
    pub fn validate_nodes(&self, nodes: &[ContentNode]) -> ValidationSummary {
        let results: Vec<NodeValidationResult> = nodes.iter().map(|n| self.validate_node(n)).collect();

        let mut issues_by_type: BTreeMap<IssueKind, usize> = IssueKind::ALL.iter().map(|&k| (k, 0)).collect();
        for issue in results.iter().flat_map(|r| &r.issues) {
            *issues_by_type.entry(issue.kind).or_insert(0) += 1;
        }

        let summary = ValidationSummary {
            total_nodes: results.len(),
            valid_nodes: results.iter().filter(|r| r.issues.is_empty()).count(),
            total_issues: issues_by_type.values().sum(),
            issues_by_type,
            results,
        };

        debug!(
            total_nodes = summary.total_nodes,
            valid_nodes = summary.valid_nodes,
            total_issues = summary.total_issues,
            "Validation run complete"
        );

        summary
    }

    // Check (a): declared subject vs canonical subject of test_id
    fn check_subject(&self, node: &ContentNode, issues: &mut Vec<ValidationIssue>) {
        let canonical = self.catalog.canonical_subject(node.test_id);

        match (node.subject_category, canonical) {
            (_, None) => issues.push(ValidationIssue {
                kind: IssueKind::TestIdMismatch,
                node_id: node.id.clone(),
                description: format!("test_id {} has no canonical subject", node.test_id),
                suggestion: None,
            }),
            (Some(declared), Some(canonical)) if declared != canonical => issues.push(ValidationIssue {
                kind: IssueKind::TestIdMismatch,
                node_id: node.id.clone(),
                description: format!(
                    "Subject area {} does not match test_id {} (expected {})",
                    declared, node.test_id, canonical
                ),
                suggestion: Some(canonical.to_string()),
            }),
            _ => {}
        }

        if node.subject_category.is_none() {
            issues.push(ValidationIssue {
                kind: IssueKind::SubjectAreaMismatch,
                node_id: node.id.clone(),
                description: "Subject area is missing or unrecognized".to_string(),
                suggestion: canonical.map(|s| s.to_string()),
            });
        }
    }

    // Check (b): cognitive level recognized
    fn check_cognitive_level(&self, node: &ContentNode, issues: &mut Vec<ValidationIssue>) {
        if node.cognitive_level.is_none() {
            issues.push(ValidationIssue {
                kind: IssueKind::CognitiveLevelMismatch,
                node_id: node.id.clone(),
                description: "Cognitive level is missing or not one of the six recognized levels".to_string(),
                suggestion: Some(paes_common::CognitiveLevel::DEFAULT.to_string()),
            });
        }
    }

    // Check (c): skill in allow-list
    fn check_skill(&self, node: &ContentNode, issues: &mut Vec<ValidationIssue>) {
        if self.catalog.is_skill_allowed(node.test_id, node.skill_id) {
            return;
        }
        let suggestion = self.catalog.default_skill(node.test_id);
        issues.push(ValidationIssue {
            kind: IssueKind::SkillMismatch,
            node_id: node.id.clone(),
            description: format!("Skill {} is not allowed for test_id {}", node.skill_id, node.test_id),
            suggestion: suggestion.map(|id| id.to_string()),
        });
    }

    // Check (d): strong keyword signal must confirm the declared subject
    fn check_thematic(&self, node: &ContentNode, score: &ThematicScore, issues: &mut Vec<ValidationIssue>) {
        if score.max_score < self.strong_signal_threshold || score.confidence > self.min_confidence {
            return;
        }
        let declared = node
            .subject_category
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let suggested = score.suggested_subject.map(|s| s.to_string());
        issues.push(ValidationIssue {
            kind: IssueKind::ThematicMismatch,
            node_id: node.id.clone(),
            description: format!(
                "Content keywords point to {} rather than {} (confidence {:.2})",
                suggested.as_deref().unwrap_or("another subject"),
                declared,
                score.confidence
            ),
            suggestion: suggested,
        });
    }
}

fn check_content(node: &ContentNode, issues: &mut Vec<ValidationIssue>) {
    if node.title.trim().is_empty() && node.description.trim().is_empty() {
        issues.push(ValidationIssue {
            kind: IssueKind::MissingContent,
            node_id: node.id.clone(),
            description: "Title and description are both empty".to_string(),
            suggestion: None,
        });
    }
}
