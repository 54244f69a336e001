pub mod chunk;
pub mod client;
pub mod stream;
pub mod types;
