pub mod config;
pub mod events;
pub mod layout;
pub mod report;
pub mod sys;
