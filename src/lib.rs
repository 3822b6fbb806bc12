pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod normalize;
pub mod schema;
pub mod table;

pub use error::{IngestError, Result};
