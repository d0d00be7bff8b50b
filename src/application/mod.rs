pub mod services;
pub mod use_case_container;
pub mod use_cases;

pub use use_case_container::UseCaseContainer;
