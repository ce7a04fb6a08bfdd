mod gst;

pub use gst::{DiscountType, GstProfile, GstSplit, GstType, LineAmounts};
