mod sequence_generator;

pub use sequence_generator::{
    collision_backoff, DocumentFamily, NumberSource, SequenceGenerator, MAX_NUMBER_ATTEMPTS,
};
