pub mod attempts;
pub mod questions;
pub mod users;
