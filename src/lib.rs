pub mod error;
pub mod record;
pub mod codec;
pub mod normalizer;
pub mod stats;
pub mod overview;
pub mod export;
pub mod config;
pub mod insight;
pub mod pipeline;

pub use error::{RankError, Result};
