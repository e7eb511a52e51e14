//! [`Repository`] backends: [`InMemoryRepository`] for tests and single
//! processes, [`MySqlRepository`] for anything that must survive a restart.

pub mod memory;
pub mod mysql;

pub use burrow_core::repository::{Repository, Result, UrlRecord};
pub use burrow_core::StorageError;
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
