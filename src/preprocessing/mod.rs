//! Preprocessing: categorical encoding and feature scaling
//!
//! Both components are fit once on the training-eligible universe and then
//! applied read-only everywhere else (evaluation, future projection). Neither
//! ever refits implicitly.

mod encoder;
mod scaler;

pub use encoder::CategoryEncoder;
pub use scaler::{Scaler, ScalerType};
