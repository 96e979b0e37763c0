use crate::model::{format_score, RecentGrade};
use std::collections::VecDeque;

pub const RECENT_CAPACITY: usize = 5;

/// Dashboard strings, at most `RECENT_CAPACITY` of them. Pushing onto a full
/// buffer drops the oldest item first.
#[derive(Debug, Clone)]
pub struct RecentGrades {
    items: VecDeque<String>,
}

impl Default for RecentGrades {
    fn default() -> Self {
        Self {
            items: VecDeque::with_capacity(RECENT_CAPACITY),
        }
    }
}

impl RecentGrades {
    pub fn push(&mut self, item: String) {
        if self.items.len() == RECENT_CAPACITY {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Replaces the contents with the given most-recent-first rows. Only the
    /// newest `RECENT_CAPACITY` rows are kept.
    pub fn fill_from(&mut self, rows: &[RecentGrade]) {
        self.items.clear();
        for row in rows.iter().take(RECENT_CAPACITY) {
            self.push(display_line(row));
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }
}

pub fn display_line(row: &RecentGrade) -> String {
    format!("{}: {}", row.course_code, format_score(row.score))
}
