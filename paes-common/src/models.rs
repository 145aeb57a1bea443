//! Canonical entity models
//!
//! One internal type per entity. Raw records from the store or from import
//! payloads are converted into these types by [`crate::normalize`] and by the
//! row mappers in the service crate; business logic only sees these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PAES test subject (one per test id)
///
/// Declaration order is the canonical catalog order and is used to break
/// score ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "COMPETENCIA_LECTORA")]
    CompetenciaLectora,
    #[serde(rename = "MATEMATICA_1")]
    Matematica1,
    #[serde(rename = "MATEMATICA_2")]
    Matematica2,
    #[serde(rename = "HISTORIA")]
    Historia,
    #[serde(rename = "CIENCIAS")]
    Ciencias,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::CompetenciaLectora,
        Subject::Matematica1,
        Subject::Matematica2,
        Subject::Historia,
        Subject::Ciencias,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::CompetenciaLectora => "COMPETENCIA_LECTORA",
            Subject::Matematica1 => "MATEMATICA_1",
            Subject::Matematica2 => "MATEMATICA_2",
            Subject::Historia => "HISTORIA",
            Subject::Ciencias => "CIENCIAS",
        }
    }

    /// Lenient parse used at the store boundary; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "COMPETENCIA_LECTORA" | "LECTURA" | "CL" => Some(Subject::CompetenciaLectora),
            "MATEMATICA_1" | "MATEMATICA1" | "M1" => Some(Subject::Matematica1),
            "MATEMATICA_2" | "MATEMATICA2" | "M2" => Some(Subject::Matematica2),
            "HISTORIA" | "HISTORIA_CIENCIAS_SOCIALES" => Some(Subject::Historia),
            "CIENCIAS" | "CIENCIAS_NATURALES" => Some(Subject::Ciencias),
            _ => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::parse(s).ok_or_else(|| crate::Error::InvalidInput(format!("Unknown subject: {}", s)))
    }
}

/// Bloom taxonomy level declared on a content node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CognitiveLevel {
    Recordar,
    Comprender,
    Aplicar,
    Analizar,
    Evaluar,
    Crear,
}

impl CognitiveLevel {
    /// Value assigned by the auto-corrector when the level is missing
    pub const DEFAULT: CognitiveLevel = CognitiveLevel::Comprender;

    pub fn as_str(&self) -> &'static str {
        match self {
            CognitiveLevel::Recordar => "RECORDAR",
            CognitiveLevel::Comprender => "COMPRENDER",
            CognitiveLevel::Aplicar => "APLICAR",
            CognitiveLevel::Analizar => "ANALIZAR",
            CognitiveLevel::Evaluar => "EVALUAR",
            CognitiveLevel::Crear => "CREAR",
        }
    }

    /// Accepts Spanish and English spellings
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "recordar" | "remember" => Some(CognitiveLevel::Recordar),
            "comprender" | "understand" => Some(CognitiveLevel::Comprender),
            "aplicar" | "apply" => Some(CognitiveLevel::Aplicar),
            "analizar" | "analyze" | "analyse" => Some(CognitiveLevel::Analizar),
            "evaluar" | "evaluate" => Some(CognitiveLevel::Evaluar),
            "crear" | "create" => Some(CognitiveLevel::Crear),
            _ => None,
        }
    }
}

impl fmt::Display for CognitiveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exercise difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    #[serde(alias = "BASIC")]
    Basico,
    #[serde(alias = "INTERMEDIATE")]
    Intermedio,
    #[serde(alias = "ADVANCED")]
    Avanzado,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Basico, Difficulty::Intermedio, Difficulty::Avanzado];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basico => "BASICO",
            Difficulty::Intermedio => "INTERMEDIO",
            Difficulty::Avanzado => "AVANZADO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "basico" | "básico" | "basic" | "easy" => Some(Difficulty::Basico),
            "intermedio" | "intermediate" | "medium" => Some(Difficulty::Intermedio),
            "avanzado" | "advanced" | "hard" => Some(Difficulty::Avanzado),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation priority. Ordering: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Content node tier, drives exercise quotas and recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierPriority {
    #[serde(rename = "tier1_critico")]
    Tier1Critico,
    #[serde(rename = "tier2_importante")]
    Tier2Importante,
    #[serde(rename = "tier3_complementario")]
    Tier3Complementario,
}

impl TierPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierPriority::Tier1Critico => "tier1_critico",
            TierPriority::Tier2Importante => "tier2_importante",
            TierPriority::Tier3Complementario => "tier3_complementario",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_lowercase();
        if lower.starts_with("tier1") {
            Some(TierPriority::Tier1Critico)
        } else if lower.starts_with("tier2") {
            Some(TierPriority::Tier2Importante)
        } else if lower.starts_with("tier3") {
            Some(TierPriority::Tier3Complementario)
        } else {
            None
        }
    }

    /// Recommendation priority inherited by node-level generation tasks
    pub fn priority(&self) -> Priority {
        match self {
            TierPriority::Tier1Critico => Priority::High,
            TierPriority::Tier2Importante => Priority::Medium,
            TierPriority::Tier3Complementario => Priority::Low,
        }
    }
}

/// Learning content node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `None` when the stored value was missing or unrecognized
    pub subject_category: Option<Subject>,
    /// `None` when the stored value was missing or unrecognized
    pub cognitive_level: Option<CognitiveLevel>,
    pub test_id: i64,
    pub skill_id: i64,
    #[serde(default)]
    pub tier_priority: Option<TierPriority>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// AI-generated exercise, aggregated read-only by the distribution analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedExercise {
    pub id: String,
    pub subject_category: Subject,
    pub difficulty_level: Difficulty,
    #[serde(default)]
    pub node_id: Option<String>,
    /// Quality in 0..1 when the generator reported one
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "ai_generated".to_string()
}

/// Per-user achievement state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub id: String,
    pub user_id: String,
    pub progress: u32,
    pub max_progress: u32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Mastery of one node by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserNodeProgress {
    pub user_id: String,
    pub node_id: String,
    /// Mastery in 0..1
    pub mastery_level: f64,
    #[serde(default)]
    pub skill_id: Option<i64>,
}

/// Learning activity event (answer submitted, node opened, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: String,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
}

/// Accumulated gamification points for ranking views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRanking {
    pub user_id: String,
    pub total_points: i64,
    pub updated_at: DateTime<Utc>,
}
