//! Simple linear regression: one feature, ordinary least squares.

pub use self::fit::{fit, MIN_SAMPLES};
pub use self::model::{predict, FittedModel};

mod fit;
mod model;
