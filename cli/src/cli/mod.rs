pub mod command;
pub mod decrypt;
pub mod exit;
pub mod info;
