//! Database Models

pub mod store;

pub use store::{NewStore, Store, StoreConfigUpdate};
