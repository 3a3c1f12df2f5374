pub mod errors;
pub mod ports;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub mod testing;

pub use errors::KnowledgeError;
