//! Content coherence layer
//!
//! # Components
//! 1. **thematic_scorer** - Keyword scoring of node text per subject
//! 2. **node_validator** - Catalog and thematic checks, aggregated summary
//! 3. **auto_corrector** - Deterministic metadata fixes for one node

pub mod auto_corrector;
pub mod node_validator;
pub mod thematic_scorer;

pub use auto_corrector::{AutoCorrector, CorrectedField, Correction, CorrectionOutcome};
pub use node_validator::{IssueKind, NodeValidationResult, NodeValidator, ValidationIssue, ValidationSummary};
pub use thematic_scorer::{ThematicScore, ThematicScorer};
