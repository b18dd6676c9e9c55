use std::fmt;

use super::phase::Phase;

/// Why a row or document was left out of a phase.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The parent row is not present on this side yet.
    MissingParent { parent: &'static str, key: String },
    /// A row with the same natural key already exists locally.
    DuplicateNaturalKey(String),
    /// The remote document could not be decoded.
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingParent { parent, key } => {
                write!(f, "{} '{}' not resolved", parent, key)
            }
            SkipReason::DuplicateNaturalKey(key) => write!(f, "duplicate of '{}'", key),
            SkipReason::Malformed(reason) => write!(f, "malformed: {}", reason),
        }
    }
}

/// A non-fatal condition reported by a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    /// Remote key of the document, or a description of the local row.
    pub subject: String,
    pub reason: SkipReason,
}

/// Counters for one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Remote documents created for local-only rows.
    pub created: usize,
    /// Pre-existing remote documents adopted by local rows.
    pub adopted: usize,
    /// Remote documents overwritten from already-linked rows.
    pub updated: usize,
    /// Remote documents inserted as new local rows.
    pub pulled: usize,
    /// Catalog rows created to satisfy an item reference.
    pub catalog_created: usize,
    pub merged_inserted: usize,
    pub merged_updated: usize,
    pub deleted_local: usize,
    /// Remote list items recreated by the terminal rewrite.
    pub rewritten: usize,
    pub skipped: Vec<Skipped>,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            created: 0,
            adopted: 0,
            updated: 0,
            pulled: 0,
            catalog_created: 0,
            merged_inserted: 0,
            merged_updated: 0,
            deleted_local: 0,
            rewritten: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn skip(&mut self, subject: impl Into<String>, reason: SkipReason) {
        let subject = subject.into();
        tracing::warn!(phase = %self.phase, subject = %subject, reason = %reason, "skipped");
        self.skipped.push(Skipped { subject, reason });
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} adopted, {} updated, {} pulled",
            self.phase, self.created, self.adopted, self.updated, self.pulled
        )?;
        if self.phase == Phase::ShoppingList {
            write!(
                f,
                ", {} merged in, {} merged changes, {} rewritten",
                self.merged_inserted, self.merged_updated, self.rewritten
            )?;
        }
        if !self.skipped.is_empty() {
            write!(f, ", {} skipped", self.skipped.len())?;
        }
        Ok(())
    }
}

/// Outcome of one `synchronize()` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub phases: Vec<PhaseReport>,
}

impl SyncReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Skipped> {
        self.phases.iter().flat_map(|p| p.skipped.iter())
    }

    /// Remote documents created across all phases, rewrites included.
    pub fn remote_creates(&self) -> usize {
        self.phases.iter().map(|p| p.created + p.rewritten).sum()
    }
}
