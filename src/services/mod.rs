pub mod backend;
pub mod identity;
