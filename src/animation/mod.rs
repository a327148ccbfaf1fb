//! Frame based animation playback and morph target animation data.

pub mod info;
pub mod morph_target_ani;
pub mod playback;
pub mod values;

pub use info::{AnimationFlags, AnimationInfo, AnimationKind, DEFAULT_FRAME_SPEED};
pub use morph_target_ani::{MorphTargetAni, MorphTargetAniManager};
pub use playback::Animation;
pub use values::Interpolatable;
