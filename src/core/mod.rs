pub mod config;
pub mod errors;

pub use config::Config;
pub use errors::RagError;
