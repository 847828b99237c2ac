//! User records and the stores that persist them.

mod dynamodb;
mod memory;
mod repo;
mod repo_types;

pub use dynamodb::DynamoDbUserRepository;
pub use memory::InMemoryUserRepository;
pub use repo::{RepositoryError, Result, UserRepository};
pub use repo_types::{NewUser, User, UserUpdate};
