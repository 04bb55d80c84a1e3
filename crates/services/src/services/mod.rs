pub mod query;
pub mod translator;
pub mod user_resolver;
