// User domain module
// User record, its public projection, and validation rules

#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{PublicUser, User};
pub use value_objects::{Email, Role};
