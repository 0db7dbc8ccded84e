//! Vineyard Module: Vine Tracking and the Engine
//!
//! A vineyard is the time-indexed family of persistence diagrams of a
//! filtration whose order changes by adjacent transpositions. Reading the
//! diagrams one after another, each point moves continuously except at
//! *crossings*, where two pairs exchange partners. Tracking pair identity
//! through the crossings turns the stack of diagrams into curves (vines).
//!
//! ## Reference
//!
//! Cohen-Steiner, Edelsbrunner, Morozov (2006). "Vines and Vineyards by
//! Updating Persistence in Linear Time". Symposium on Computational
//! Geometry.

mod engine;
mod tracker;

pub use engine::{TranspositionEvent, Vineyard};
pub use tracker::{DiagramSnapshot, Evaluator, StoredValues, Vine, VineId, VineSample};
