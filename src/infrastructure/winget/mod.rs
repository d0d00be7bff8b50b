pub mod command;
pub mod repository;
pub mod resolver;

pub use command::WingetCommand;
pub use repository::WingetPackageRepository;
pub use resolver::PackageInfoResolver;
