pub mod categorizer;
pub mod checkpoint;
pub mod generation;
pub mod input;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod sink;
