pub mod catalog;
pub mod plan;
pub mod posting;
pub mod question;
