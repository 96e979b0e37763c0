use crate::aggregate::{DashboardStats, GradeAggregate};
use crate::model::{GradeEntry, RecentGrade, StudentProfile};
use crate::recent::RecentGrades;
use crate::sort::{sort_entries, SortKey};
use std::collections::HashMap;

/// In-memory state for the single logged-in student.
///
/// Every derived structure is rebuilt on `activate`/`reload` and emptied on
/// `clear`, so nothing from a previous owner survives an owner switch.
#[derive(Debug, Default)]
pub struct Session {
    owner: Option<StudentProfile>,
    aggregate: GradeAggregate,
    display: Vec<GradeEntry>,
    sort_key: Option<SortKey>,
    recent: RecentGrades,
    recent_rows: Vec<RecentGrade>,
}

impl Session {
    pub fn owner(&self) -> Option<&StudentProfile> {
        self.owner.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    pub fn activate(
        &mut self,
        owner: StudentProfile,
        entries: Vec<GradeEntry>,
        recent: &[RecentGrade],
        sort_key: Option<SortKey>,
    ) {
        self.clear();
        self.owner = Some(owner);
        self.load(entries, recent, sort_key);
    }

    /// Re-derives everything from freshly fetched data. No-op without an owner.
    pub fn reload(&mut self, entries: Vec<GradeEntry>, recent: &[RecentGrade], sort_key: Option<SortKey>) {
        if self.owner.is_none() {
            return;
        }
        self.load(entries, recent, sort_key);
    }

    fn load(&mut self, entries: Vec<GradeEntry>, recent: &[RecentGrade], sort_key: Option<SortKey>) {
        self.aggregate = GradeAggregate::from_entries(entries);
        self.display = self.aggregate.records().to_vec();
        self.sort_key = None;
        self.recent.fill_from(recent);
        self.recent_rows = recent.to_vec();
        if let Some(key) = sort_key {
            self.sort(key);
        }
    }

    pub fn clear(&mut self) {
        self.owner = None;
        self.aggregate = GradeAggregate::default();
        self.display.clear();
        self.sort_key = None;
        self.recent.clear();
        self.recent_rows.clear();
    }

    /// Reorders the display list. No-op without an owner.
    pub fn sort(&mut self, key: SortKey) {
        if self.owner.is_none() {
            return;
        }
        self.display = sort_entries(&self.display, key);
        self.sort_key = Some(key);
    }

    pub fn set_owner_profile(&mut self, profile: StudentProfile) {
        if self.owner.as_ref().map(|o| o.id == profile.id).unwrap_or(false) {
            self.owner = Some(profile);
        }
    }

    pub fn records(&self) -> &[GradeEntry] {
        &self.display
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_key
    }

    pub fn enrolled_courses(&self) -> &[String] {
        self.aggregate.enrolled_courses()
    }

    pub fn stats(&self, decimals: usize) -> DashboardStats {
        self.aggregate.stats(decimals)
    }

    pub fn recent(&self) -> Vec<String> {
        self.recent.to_vec()
    }

    pub fn recent_rows(&self) -> &[RecentGrade] {
        &self.recent_rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LoginKey {
    student_number: String,
    username: String,
}

#[derive(Debug, Clone)]
struct CachedLogin {
    password: String,
    profile: StudentProfile,
}

/// Verified logins for the current workspace, used to skip the database on
/// repeat logins. Owned by the app state and handed to the login flow.
///
/// Invalidation: one entry on a failed login or password change, everything
/// on workspace switch.
#[derive(Debug, Default)]
pub struct CredentialCache {
    entries: HashMap<LoginKey, CachedLogin>,
}

impl CredentialCache {
    /// Profile for a cached, matching login.
    pub fn check(&self, student_number: &str, username: &str, password: &str) -> Option<&StudentProfile> {
        let key = LoginKey {
            student_number: student_number.to_string(),
            username: username.to_string(),
        };
        self.entries
            .get(&key)
            .filter(|c| c.password == password)
            .map(|c| &c.profile)
    }

    pub fn remember(&mut self, student_number: &str, username: &str, password: &str, profile: &StudentProfile) {
        self.entries.insert(
            LoginKey {
                student_number: student_number.to_string(),
                username: username.to_string(),
            },
            CachedLogin {
                password: password.to_string(),
                profile: profile.clone(),
            },
        );
    }

    pub fn forget(&mut self, student_number: &str, username: &str) {
        self.entries.remove(&LoginKey {
            student_number: student_number.to_string(),
            username: username.to_string(),
        });
    }

    pub fn forget_student(&mut self, student_id: &str) {
        self.entries.retain(|_, c| c.profile.id != student_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
