pub mod provider;
pub mod resolver;
pub mod sink;
