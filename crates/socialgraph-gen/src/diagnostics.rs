//! Soft constraint diagnostics.
//!
//! Explicit overrides may knowingly break a default-only invariant. Under the
//! `warn` policy the call still succeeds and leaves one of these behind.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateRelationForced,
    ExtraParentForced,
    RomanticConflictForced,
    SecondEducationForced,
    SecondEmploymentForced,
    UsernameDensity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log one diagnostic.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = ?kind, "{message}");
        self.events.push(Diagnostic { kind, message });
    }

    /// Move every diagnostic out of `other` (already logged) into this list.
    pub fn absorb(&mut self, mut other: Diagnostics) {
        self.events.append(&mut other.events);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.events.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hand every recorded diagnostic to the caller, leaving the list empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_list() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticKind::UsernameDensity, "dense");
        diagnostics.push(DiagnosticKind::ExtraParentForced, "third parent");
        assert_eq!(diagnostics.count_of(DiagnosticKind::UsernameDensity), 1);

        let mut total = Diagnostics::new();
        total.absorb(diagnostics);
        assert_eq!(total.len(), 2);

        let drained = total.drain();
        assert_eq!(drained.len(), 2);
        assert!(total.is_empty());
    }
}
