pub mod admin;
pub mod exchange;
