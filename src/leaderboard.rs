//! Running tally of classified categories.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Category;

/// One row of the ranked view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub category: String,
    pub count: u64,
}

/// Category -> count, in first-observation order.
///
/// Categories appear only once recorded; counts only ever grow by one.
#[derive(Clone, Debug, Default)]
pub struct Leaderboard {
    entries: Vec<(Category, u64)>,
    index: HashMap<Category, usize>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `category`, inserting it at 1 on first sight.
    ///
    /// Returns false (and changes nothing) for an empty category.
    pub fn record(&mut self, category: &Category) -> bool {
        if category.is_empty() {
            return false;
        }
        match self.index.get(category) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(category.clone(), self.entries.len());
                self.entries.push((category.clone(), 1));
            }
        }
        true
    }

    pub fn count(&self, category: &Category) -> u64 {
        self.index
            .get(category)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Snapshot sorted by count descending. Ties keep first-insertion order.
    pub fn ranked_view(&self) -> Vec<LeaderboardEntry> {
        let mut view: Vec<LeaderboardEntry> = self
            .entries
            .iter()
            .map(|(category, count)| LeaderboardEntry {
                category: category.name().to_string(),
                count: *count,
            })
            .collect();
        // sort_by is stable
        view.sort_by(|a, b| b.count.cmp(&a.count));
        view
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str) -> Category {
        Category::new(name)
    }

    #[test]
    fn record_inserts_then_increments() {
        let mut board = Leaderboard::new();
        assert!(board.is_empty());
        assert!(board.record(&cat("Gir")));
        assert_eq!(board.count(&cat("Gir")), 1);
        assert!(board.record(&cat("Gir")));
        assert_eq!(board.count(&cat("Gir")), 2);
        assert_eq!(board.count(&cat("Toda")), 0);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn empty_category_is_ignored() {
        let mut board = Leaderboard::new();
        assert!(!board.record(&cat("")));
        assert!(board.is_empty());
        assert!(board.ranked_view().is_empty());
    }

    #[test]
    fn ranked_view_sorts_by_count_then_first_seen() {
        let mut board = Leaderboard::new();
        for name in ["Toda", "Gir", "Surti", "Gir", "Surti", "Rathi"] {
            board.record(&cat(name));
        }
        let view = board.ranked_view();
        let names: Vec<&str> = view.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(names, vec!["Gir", "Surti", "Toda", "Rathi"]);
        assert_eq!(view[0].count, 2);
        assert_eq!(view[3].count, 1);
        assert_eq!(board.total(), 6);
    }

    #[test]
    fn ranked_view_is_a_snapshot() {
        let mut board = Leaderboard::new();
        board.record(&cat("Gir"));
        let before = board.ranked_view();
        board.record(&cat("Gir"));
        assert_eq!(before[0].count, 1);
        assert_eq!(board.ranked_view()[0].count, 2);
    }
}
