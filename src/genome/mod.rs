//! Genome abstractions and implementations
//!
//! This module provides the core genome traits and the `BitString` genome.

pub mod bit_string;
pub mod traits;

pub mod prelude {
    pub use super::bit_string::*;
    pub use super::traits::*;
}
