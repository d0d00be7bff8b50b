pub mod catalog_repository;
pub mod package_repository;
pub mod package_status_repository;
pub mod tool_runner;

pub use catalog_repository::CatalogRepository;
pub use package_repository::PackageRepository;
pub use package_status_repository::PackageStatusRepository;
pub use tool_runner::{ProcessOutput, ProcessStatus, ToolRunner};
