//! Domain Layer

pub mod entities;
pub mod repository;

pub use entities::{Post, PostFields};
pub use repository::PostRepository;
