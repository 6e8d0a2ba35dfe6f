pub mod schema;
pub mod mapping;
