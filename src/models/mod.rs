pub mod image;
pub mod listing;
pub mod session;
