pub mod admin;
pub mod portal;
pub mod public;
