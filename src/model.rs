use serde::Serialize;

/// One course row for one student. Scores are independently optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntry {
    pub id: String,
    pub student_id: String,
    pub course_code: String,
    pub course_name: String,
    pub prelim: Option<f64>,
    pub midterm: Option<f64>,
    pub finals: Option<f64>,
    pub remarks: Option<String>,
}

impl GradeEntry {
    /// Best available score: finals, then midterm, then prelim.
    pub fn effective_score(&self) -> Option<f64> {
        self.finals.or(self.midterm).or(self.prelim)
    }
}

/// Row of the most-recent-first query. `score` is already the effective score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGrade {
    pub course_code: String,
    pub score: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub student_number: String,
    pub username: String,
    pub full_name: String,
    pub profile_picture_sha256: Option<String>,
}

impl StudentProfile {
    pub fn has_profile_picture(&self) -> bool {
        self.profile_picture_sha256.is_some()
    }
}

/// Renders a score the way the dashboard shows it: shortest form, but always
/// with a decimal part (`2.0`, not `2`).
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
        Some(v) => format!("{}", v),
        None => "—".to_string(),
    }
}

#[cfg(test)]
pub(crate) fn entry(code: &str, prelim: Option<f64>, midterm: Option<f64>, finals: Option<f64>) -> GradeEntry {
    GradeEntry {
        id: format!("id-{code}"),
        student_id: "s1".to_string(),
        course_code: code.to_string(),
        course_name: format!("{code} course"),
        prelim,
        midterm,
        finals,
        remarks: None,
    }
}
