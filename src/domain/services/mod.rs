pub mod catalog_filter;
pub mod output_parser;
pub mod validation;

pub use catalog_filter::CatalogFilter;
pub use validation::PackageValidator;
