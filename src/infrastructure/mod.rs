pub mod catalog_repository;
pub mod config_repository;
pub mod process;
pub mod winget;

pub use catalog_repository::JsonCatalogRepository;
pub use config_repository::ConfigRepository;
pub use process::ProcessRunner;
