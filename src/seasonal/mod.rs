//! Seasonal-trend decomposition (STL and its multi-period extension).

mod mstl;
mod stl;

pub use mstl::{Mstl, MstlDecomposition};
pub use stl::{Stl, StlDecomposition};
