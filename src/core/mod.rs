pub mod error;
pub mod money;

pub use error::{AppError, Result};
pub use money::{round_money, round_rupees};
