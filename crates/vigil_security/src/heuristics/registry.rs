//! # Subject Registry
//!
//! One [`Detector`] per online subject, created on first use and finalized
//! when the subject leaves.

use std::collections::HashMap;

use vigil_core::SubjectId;

use super::{Detector, Millis};
use crate::host::VitalsControl;

/// A tracked subject.
#[derive(Clone, Debug)]
pub struct Subject {
    /// Identity.
    pub id: SubjectId,
    /// When the detector was created.
    pub created_at: Millis,
    /// Analysis state.
    pub detector: Detector,
}

/// All tracked subjects.
#[derive(Debug, Default)]
pub struct SubjectRegistry {
    subjects: HashMap<SubjectId, Subject>,
}

impl SubjectRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Whether the subject is tracked.
    #[must_use]
    pub fn contains(&self, id: SubjectId) -> bool {
        self.subjects.contains_key(&id)
    }

    /// Tracked subject, if any.
    #[must_use]
    pub fn get(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    /// Returns the subject, creating a fresh one if absent.
    pub fn resolve(&mut self, id: SubjectId, now: Millis) -> &mut Subject {
        self.subjects.entry(id).or_insert_with(|| {
            tracing::debug!("Tracking subject {}", id);
            Subject {
                id,
                created_at: now,
                detector: Detector::new(),
            }
        })
    }

    /// Finalizes and discards a subject: state is reset and any vitals
    /// override is rolled back.
    ///
    /// Returns `false` if the subject was not tracked.
    pub fn remove<V: VitalsControl + ?Sized>(&mut self, id: SubjectId, vitals: &mut V) -> bool {
        let Some(mut subject) = self.subjects.remove(&id) else {
            return false;
        };
        subject.detector.reset();
        subject.detector.close(id, vitals);
        true
    }

    /// Identities of all tracked subjects.
    #[must_use]
    pub fn ids(&self) -> Vec<SubjectId> {
        self.subjects.keys().copied().collect()
    }

    /// Subjects with deferred work due at `tick`.
    #[must_use]
    pub fn ids_with_due_work(&self, tick: u64) -> Vec<SubjectId> {
        self.subjects
            .values()
            .filter(|s| s.detector.exploit.has_due_work(tick))
            .map(|s| s.id)
            .collect()
    }
}
