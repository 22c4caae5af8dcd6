//! In-memory recommendation list with per-item selection flags.

use thiserror::Error;

use crate::models::Recommendation;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No recommendation at index {index} (list has {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered recommendations, each independently selectable.
///
/// The selected count is always derived from the flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: Vec<Recommendation>,
}

impl Selection {
    pub fn new(items: Vec<Recommendation>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Recommendation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the whole list. Nothing from the previous list is kept.
    pub fn replace(&mut self, items: Vec<Recommendation>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Flip the selected flag of the item at `index` only.
    pub fn toggle(&mut self, index: usize) -> Result<(), SelectionError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(SelectionError::OutOfRange { index, len })?;
        item.selected = !item.selected;
        Ok(())
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|r| r.selected).count()
    }

    pub fn selected(&self) -> impl Iterator<Item = &Recommendation> {
        self.items.iter().filter(|r| r.selected)
    }

    /// Remove every selected item, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn remove_selected(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|r| !r.selected);
        before - self.items.len()
    }

    /// Remove the first `count` selected items (in list order).
    pub fn remove_first_selected(&mut self, count: usize) -> usize {
        let mut remaining = count;
        self.items.retain(|r| {
            if r.selected && remaining > 0 {
                remaining -= 1;
                false
            } else {
                true
            }
        });
        count - remaining
    }
}
