pub mod aggregate;
pub mod model;
