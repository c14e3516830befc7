pub mod property;
pub mod validation;
