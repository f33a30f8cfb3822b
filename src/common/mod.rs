// Common utilities and abstractions module
pub mod color;
pub mod constants;
pub mod utils;
