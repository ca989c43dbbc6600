pub mod chunk;
pub mod json;
pub mod logging;
