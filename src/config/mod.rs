pub mod args;
mod r#impl;
mod structs;

pub use args::RunMode;
pub use structs::*;
