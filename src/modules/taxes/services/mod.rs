mod gst_calculator;

pub use gst_calculator::GstCalculator;
