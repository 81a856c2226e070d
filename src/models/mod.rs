//! Data models for group membership editing.
//!
//! These models match the frontend TypeScript interfaces for seamless interoperability.

mod group;
mod member;
mod page;
mod photo;

pub use group::*;
pub use member::*;
pub use page::*;
pub use photo::*;
