//! The control-flow types shared by every transaction.

mod lookup;

pub use lookup::*;
