pub mod context;
pub mod format;

pub use context::{ChainContext, ProviderHandle};
