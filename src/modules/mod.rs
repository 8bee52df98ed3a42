pub mod extract;
pub mod info;
