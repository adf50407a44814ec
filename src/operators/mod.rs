//! Genetic operators
//!
//! This module provides selection and replacement operators.

pub mod replacement;
pub mod selection;
pub mod traits;

pub mod prelude {
    pub use super::replacement::*;
    pub use super::selection::*;
    pub use super::traits::*;
}
