pub mod router;
pub mod types;
pub mod handlers {
    pub mod actors;
    pub mod common;
    pub mod flags;
    pub mod health;
    pub mod movies;
    pub mod ratings;
    pub mod reviews;
    pub mod tags;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
