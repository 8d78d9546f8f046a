//! # Meme Pipeline
//!
//! Coordinates image loading, face detection, prop placement and output,
//! shared by the command-line tool and the HTTP server.

pub mod engine;
pub mod output;

// Re-exports for convenience
pub use engine::{MemeImage, MemePipeline, MemeReport};
pub use output::{unique_output_path, write_output};
