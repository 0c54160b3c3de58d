pub mod presence;
pub mod streaming;
pub mod support;
pub mod typing;
