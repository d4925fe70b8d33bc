//! Source resolution and loading

pub mod loader;
pub mod resolver;

pub use loader::{load_path, load_url, DEFAULT_FETCH_TIMEOUT};
pub use resolver::PathResolver;
