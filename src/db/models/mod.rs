pub mod submission;

pub use submission::{SubmissionCounts, SubmissionRecord};
