pub mod auth;
pub mod core;
pub mod dashboard;
pub mod grades;
pub mod profile;
pub mod setup;
pub mod students;
