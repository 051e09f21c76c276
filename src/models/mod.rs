pub mod implementations;

pub use implementations::{FinBertModel, FinBertOptions};
