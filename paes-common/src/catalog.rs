//! Immutable PAES catalog
//!
//! Holds every fixed lookup table the coherence and distribution code needs:
//! - test id → canonical subject
//! - per-test skill allow-lists
//! - skill codes
//! - the weighted keyword lexicon per subject
//!
//! The catalog is parsed once at startup (embedded TOML or an override file),
//! validated, and then shared read-only behind an `Arc`.

use crate::models::Subject;
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const EMBEDDED_CATALOG: &str = include_str!("../data/catalog.toml");

static EMBEDDED: OnceCell<Arc<Catalog>> = OnceCell::new();

/// Weighted lexicon entry (term stored lower-cased)
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
}

/// One PAES test with its subject and allowed skills
#[derive(Debug, Clone, PartialEq)]
pub struct TestEntry {
    pub test_id: i64,
    pub subject: Subject,
    /// Allowed skill ids; the first entry is the auto-correction default
    pub skills: Vec<i64>,
}

/// Validated, immutable catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    tests: Vec<TestEntry>,
    skills: BTreeMap<i64, String>,
    lexicon: BTreeMap<Subject, Vec<Keyword>>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tests: Vec<TestEntryFile>,
    skills: Vec<SkillEntryFile>,
    lexicon: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct TestEntryFile {
    test_id: i64,
    subject: String,
    skills: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct SkillEntryFile {
    id: i64,
    code: String,
}

impl Catalog {
    /// Parse and validate a catalog document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse catalog failed: {}", e)))?;

        let mut skills = BTreeMap::new();
        for skill in file.skills {
            if skills.insert(skill.id, skill.code).is_some() {
                return Err(Error::Config(format!("Duplicate skill id {}", skill.id)));
            }
        }

        let mut tests = Vec::with_capacity(file.tests.len());
        let mut seen_ids = HashSet::new();
        for entry in file.tests {
            let subject = Subject::parse(&entry.subject).ok_or_else(|| {
                Error::Config(format!("Unknown subject '{}' for test {}", entry.subject, entry.test_id))
            })?;
            if !seen_ids.insert(entry.test_id) {
                return Err(Error::Config(format!("Duplicate test id {}", entry.test_id)));
            }
            if entry.skills.is_empty() {
                return Err(Error::Config(format!("Test {} has an empty skill allow-list", entry.test_id)));
            }
            if let Some(unknown) = entry.skills.iter().find(|id| !skills.contains_key(*id)) {
                return Err(Error::Config(format!(
                    "Test {} allows unknown skill id {}",
                    entry.test_id, unknown
                )));
            }
            tests.push(TestEntry {
                test_id: entry.test_id,
                subject,
                skills: entry.skills,
            });
        }

        for subject in Subject::ALL {
            if !tests.iter().any(|t| t.subject == subject) {
                return Err(Error::Config(format!("No test mapped to subject {}", subject)));
            }
        }

        let mut lexicon = BTreeMap::new();
        for (subject_name, terms) in file.lexicon {
            let subject = Subject::parse(&subject_name)
                .ok_or_else(|| Error::Config(format!("Unknown lexicon subject '{}'", subject_name)))?;
            let mut keywords = Vec::with_capacity(terms.len());
            for (term, weight) in terms {
                if !(weight > 0.0) {
                    return Err(Error::Config(format!(
                        "Keyword '{}' for {} must have a positive weight",
                        term, subject
                    )));
                }
                keywords.push(Keyword {
                    term: term.trim().to_lowercase(),
                    weight,
                });
            }
            lexicon.insert(subject, keywords);
        }

        Ok(Self { tests, skills, lexicon })
    }

    /// Catalog compiled into the binary, parsed on first use
    pub fn embedded() -> Result<Arc<Catalog>> {
        EMBEDDED
            .get_or_try_init(|| Catalog::from_toml_str(EMBEDDED_CATALOG).map(Arc::new))
            .cloned()
    }

    /// Load from an override file, or fall back to the embedded catalog
    pub fn load(path: Option<&Path>) -> Result<Arc<Catalog>> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Read catalog {} failed: {}", path.display(), e)))?;
                let catalog = Catalog::from_toml_str(&content)?;
                info!("Loaded catalog override from {}", path.display());
                Ok(Arc::new(catalog))
            }
            None => Catalog::embedded(),
        }
    }

    pub fn tests(&self) -> &[TestEntry] {
        &self.tests
    }

    /// Canonical subject for a test id
    pub fn canonical_subject(&self, test_id: i64) -> Option<Subject> {
        self.test(test_id).map(|t| t.subject)
    }

    /// First test id mapped to a subject
    pub fn test_id_for(&self, subject: Subject) -> Option<i64> {
        self.tests.iter().find(|t| t.subject == subject).map(|t| t.test_id)
    }

    /// Skill allow-list for a test id (empty for unknown tests)
    pub fn allowed_skills(&self, test_id: i64) -> &[i64] {
        self.test(test_id).map(|t| t.skills.as_slice()).unwrap_or(&[])
    }

    pub fn is_skill_allowed(&self, test_id: i64, skill_id: i64) -> bool {
        self.allowed_skills(test_id).contains(&skill_id)
    }

    /// First allowed skill for a test id
    pub fn default_skill(&self, test_id: i64) -> Option<i64> {
        self.allowed_skills(test_id).first().copied()
    }

    pub fn skill_code(&self, skill_id: i64) -> Option<&str> {
        self.skills.get(&skill_id).map(String::as_str)
    }

    /// Lexicon for a subject (empty when the subject has no keywords)
    pub fn keywords(&self, subject: Subject) -> &[Keyword] {
        self.lexicon.get(&subject).map(Vec::as_slice).unwrap_or(&[])
    }

    fn test(&self, test_id: i64) -> Option<&TestEntry> {
        self.tests.iter().find(|t| t.test_id == test_id)
    }
}
