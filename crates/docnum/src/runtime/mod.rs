mod tokio;

pub use tokio::*;
