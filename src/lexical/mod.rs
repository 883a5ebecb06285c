//! Lexical search: morphological variant detection, joint-relevance union
//! search, and noise floor computation.

pub mod noise_floor;
pub mod union;
pub mod variants;

#[cfg(test)]
mod tests;

pub use noise_floor::NoiseFloorFinder;
pub use union::LexicalUnionFinder;
pub use variants::is_morphological_variant;
