pub mod models;
pub mod services;

pub use models::{DiscountType, GstProfile, GstSplit, GstType, LineAmounts};
pub use services::GstCalculator;
