pub mod history;
pub mod message;
