/// Storage services backing the support inbox.
pub mod support_store;

pub use support_store::SupportStore;
