//! Infrastructure Layer
//!
//! Postgres repository plus in-process store and cache.

pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::MemoryUserCache;
pub use memory::InMemoryUserRepository;
pub use postgres::PgAuthRepository;
