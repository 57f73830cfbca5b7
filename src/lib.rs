pub mod auth;
pub mod billing;
pub mod config;
pub mod database;
pub mod disc;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod prompt;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::CounselorError;
pub use routes::build_router;
pub use state::AppState;
