//! Skeleton templates and their runtime poses.
//!
//! - [`Skeleton`]: shared, immutable joint hierarchy with bind pose and
//!   optional frame keys
//! - [`JointHandler`]: per-joint runtime pose and skinning transform
//! - [`SkeletonHandler`]: current and base handler arrays of one instance

pub mod handler;
pub mod joint;
pub mod joint_handler;
pub mod resource;

pub use handler::SkeletonHandler;
pub use joint::{AnimatedComponents, Joint};
pub use joint_handler::JointHandler;
pub use resource::{Skeleton, SkeletonManager};
