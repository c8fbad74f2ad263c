pub mod backend;
pub mod backends;
pub mod connection;
pub mod entities;
pub mod policy;
pub mod repository;

#[cfg(test)]
mod backend_tests;

pub use backend::SeaOrmBackend;
pub use connection::connect;
pub use policy::{FixedRolePolicy, NewUser, PromotingPolicy, RolePolicy, policy_from_config};
pub use repository::{UserRepository, VisitRepository};
