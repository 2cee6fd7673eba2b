pub mod api;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use error::ReportError;
pub use loader::Upload;
pub use service::ReportService;
