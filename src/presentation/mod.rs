pub mod formatters;
pub mod http;
