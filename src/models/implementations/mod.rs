pub mod finbert;

pub use finbert::{FinBertModel, FinBertOptions};
