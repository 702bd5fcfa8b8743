pub mod popularity;

pub use popularity::{most_popular, PopularRating, PopularityError};
