pub mod compiler;
pub mod content;
pub mod evaluator;
pub mod parser;
pub mod repository;
pub mod template;
pub mod validate;
