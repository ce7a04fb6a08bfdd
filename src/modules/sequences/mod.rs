pub mod services;

pub use services::{
    collision_backoff, DocumentFamily, NumberSource, SequenceGenerator, MAX_NUMBER_ATTEMPTS,
};
