pub use super::users::Entity as Users;
pub use super::visits::Entity as Visits;
