// Store domain module

#![allow(clippy::module_inception)]

pub mod store;

pub use store::Store;
