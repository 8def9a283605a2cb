pub mod location;
pub mod survey;
pub mod user;

pub use location::Coordinates;
pub use survey::SurveyPayload;
pub use user::{AuthSession, UserProfile};
