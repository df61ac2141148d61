//! Command implementations

pub mod inspect;
pub mod pack;
pub mod resolve;
pub mod validate;
pub mod version;
