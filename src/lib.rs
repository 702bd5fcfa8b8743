pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{MovieService, RatingService, ServiceError, TagService};
pub use domain::model::{Actor, Collection, Flag, Movie, Rating, Review, Tag};
pub use infra::config::Config;
pub use storage::docs::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
