pub mod document;
pub mod posting;
pub mod sortable;
pub mod termgen;
