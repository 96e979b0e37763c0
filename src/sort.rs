use crate::model::GradeEntry;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CourseCode,
    FinalGrade,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "courseCode" => Some(Self::CourseCode),
            "finalGrade" => Some(Self::FinalGrade),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CourseCode => "courseCode",
            Self::FinalGrade => "finalGrade",
        }
    }
}

/// Top-down merge sort. Returns a new vector; the input is left as is.
/// Ties keep their input order.
pub fn merge_sort<T, F>(items: &[T], cmp: &mut F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items.to_vec();
    }
    let mid = items.len() / 2;
    let left = merge_sort(&items[..mid], cmp);
    let right = merge_sort(&items[mid..], cmp);
    merge(left, right, cmp)
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, cmp: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        out.extend(next);
    }
    out
}

/// Case-insensitive lexicographic order on course code.
pub fn compare_course_code(a: &GradeEntry, b: &GradeEntry) -> Ordering {
    let a = a.course_code.chars().flat_map(char::to_lowercase);
    let b = b.course_code.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

/// Ascending by effective score. Entries with no score at all sort first.
pub fn compare_effective_score(a: &GradeEntry, b: &GradeEntry) -> Ordering {
    match (a.effective_score(), b.effective_score()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

pub fn sort_entries(entries: &[GradeEntry], key: SortKey) -> Vec<GradeEntry> {
    match key {
        SortKey::CourseCode => merge_sort(entries, &mut compare_course_code),
        SortKey::FinalGrade => merge_sort(entries, &mut compare_effective_score),
    }
}
