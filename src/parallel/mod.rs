pub mod scheduler;
pub mod indexer;
pub mod merger;
