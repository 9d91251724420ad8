pub mod detail;
pub mod feed;
