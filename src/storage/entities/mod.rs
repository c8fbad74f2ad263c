pub mod prelude;

pub mod users;
pub mod visits;
