//! Lower-Star Module: Vineyards of Moving Vertex Functions
//!
//! For a function f on the vertices of a simplicial complex, the lower-star
//! filtration adds each simplex when its highest vertex appears:
//!
//!   f(σ) = max { f(v) : v ∈ σ }
//!
//! When f varies over time, the filtration order only changes where two
//! vertex values cross. A kinetic sort finds those crossings in time order
//! and each one is translated into adjacent transpositions of the vineyard
//! engine.

mod driver;
mod kinetic;

pub use driver::LowerStarVineyard;
pub use kinetic::{KineticEvent, KineticSort};
