use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::note::{Note, NoteInput};
use super::settings::DEFAULT_MAX_NOTES;
use super::weights::{WeightComponent, Weights};

/// The session's notes (in insertion order) plus the active weights.
///
/// Lives only for the session; nothing here is persisted. Every mutation
/// validates first, so a rejected call leaves the set untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    notes: Vec<Note>,
    weights: Weights,
    capacity: usize,
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingSet {
    /// Empty set with default weights and the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_NOTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notes: Vec::new(),
            weights: Weights::default(),
            capacity,
        }
    }

    // ── Notes ───────────────────────────────────────────────────────

    /// Validate and append a new note. Refused when the set is full.
    pub fn add_note(&mut self, input: NoteInput) -> Result<&Note, CoreError> {
        self.ensure_room()?;
        let note = Note::new(input)?;
        self.notes.push(note);
        Ok(&self.notes[self.notes.len() - 1])
    }

    /// Append an already-built note (e.g. loaded from a report).
    /// The note's terms are re-validated and its score is discarded.
    pub fn push_note(&mut self, mut note: Note) -> Result<(), CoreError> {
        self.ensure_room()?;
        note.input().validate()?;
        note.ticker = note.ticker.trim().to_uppercase();
        note.invalidate_score();
        self.notes.push(note);
        Ok(())
    }

    /// Remove the note at `index` (0-based, display order).
    pub fn remove_note(&mut self, index: usize) -> Result<Note, CoreError> {
        if index >= self.notes.len() {
            return Err(CoreError::NoteNotFound(index));
        }
        Ok(self.notes.remove(index))
    }

    /// Remove every note. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.notes.len();
        self.notes.clear();
        removed
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Mutable access to existing notes; the length cannot change.
    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.notes.len() >= self.capacity
    }

    /// Present scores, in note order.
    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.notes.iter().filter_map(|n| n.score).collect()
    }

    #[must_use]
    pub fn has_scores(&self) -> bool {
        self.notes.iter().any(|n| n.score.is_some())
    }

    // ── Weights ─────────────────────────────────────────────────────

    #[must_use]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Change one weight. Existing scores no longer match and are cleared.
    pub fn set_weight(&mut self, component: WeightComponent, value: f64) -> Result<(), CoreError> {
        self.weights.set(component, value)?;
        self.invalidate_scores();
        Ok(())
    }

    /// Restore the baseline weights.
    pub fn reset_weights(&mut self) {
        self.weights = Weights::default();
        self.invalidate_scores();
    }

    /// Split borrow used by the scoring pass.
    pub fn notes_and_weights_mut(&mut self) -> (&mut [Note], &Weights) {
        (&mut self.notes, &self.weights)
    }

    fn invalidate_scores(&mut self) {
        for note in &mut self.notes {
            note.invalidate_score();
        }
    }

    fn ensure_room(&self) -> Result<(), CoreError> {
        if self.is_full() {
            return Err(CoreError::CapacityExceeded { max: self.capacity });
        }
        Ok(())
    }
}
