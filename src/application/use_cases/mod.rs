pub mod package_operations;

pub use package_operations::*;
