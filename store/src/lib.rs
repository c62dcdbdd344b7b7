//! Asset graph store — the `Repository` contract, an in-memory reference
//! backend, and the write-through/read-fill `CacheRepo` composite.

pub mod cache;
pub mod mock;
pub mod repository;

pub use cache::CacheRepo;
pub use mock::InMemoryRepository;
pub use repository::Repository;
