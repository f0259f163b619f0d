pub mod accounts;
pub mod applications;
pub mod auth;
pub mod candidates;
pub mod dashboard;
pub mod jobs;
pub mod probes;
pub mod reviews;
