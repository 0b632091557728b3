//! Shared types: entity ids, hands, transforms and sampled poses.

mod types;

pub use types::{EntityId, Hand, HandPose, Transform};
