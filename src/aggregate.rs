use crate::model::GradeEntry;
use serde::Serialize;

pub const GWA_PLACEHOLDER: &str = "—";

/// Dashboard figures derived from one student's full grade set.
/// Always rebuilt from scratch; never patched in place.
#[derive(Debug, Clone, Default)]
pub struct GradeAggregate {
    records: Vec<GradeEntry>,
    enrolled_courses: Vec<String>,
    effective_scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub gwa: Option<f64>,
    pub gwa_display: String,
    pub enrolled_courses: usize,
}

impl GradeAggregate {
    pub fn from_entries(entries: Vec<GradeEntry>) -> Self {
        let mut enrolled_courses: Vec<String> = Vec::new();
        let mut effective_scores = Vec::with_capacity(entries.len());

        for e in &entries {
            if !enrolled_courses.iter().any(|c| c == &e.course_code) {
                enrolled_courses.push(e.course_code.clone());
            }
            if let Some(v) = e.effective_score() {
                effective_scores.push(v);
            }
        }

        Self {
            records: entries,
            enrolled_courses,
            effective_scores,
        }
    }

    pub fn records(&self) -> &[GradeEntry] {
        &self.records
    }

    pub fn enrolled_courses(&self) -> &[String] {
        &self.enrolled_courses
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled_courses.len()
    }

    /// Mean of effective scores. Unscored entries are left out of both sides.
    pub fn gwa(&self) -> Option<f64> {
        if self.effective_scores.is_empty() {
            return None;
        }
        let sum: f64 = self.effective_scores.iter().sum();
        Some(sum / self.effective_scores.len() as f64)
    }

    pub fn stats(&self, decimals: usize) -> DashboardStats {
        let gwa = self.gwa();
        DashboardStats {
            gwa,
            gwa_display: format_gwa(gwa, decimals),
            enrolled_courses: self.enrolled_count(),
        }
    }
}

/// Fixed-point display, ties rounded half up (1.125 -> "1.13").
pub fn format_gwa(gwa: Option<f64>, decimals: usize) -> String {
    match gwa {
        Some(v) => format!("{:.*}", decimals, round_half_up(v, decimals)),
        None => GWA_PLACEHOLDER.to_string(),
    }
}

fn round_half_up(v: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let scaled = (v * scale).round() / scale;
    if scaled.is_finite() {
        scaled
    } else {
        v
    }
}

/// Manual calculator: plain mean of the three term scores.
pub fn term_gwa(prelim: f64, midterm: f64, finals: f64) -> f64 {
    (prelim + midterm + finals) / 3.0
}
