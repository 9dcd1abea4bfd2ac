pub mod conversion_service;
pub mod file_service;

pub use conversion_service::{ConversionService, ToolPaths};
