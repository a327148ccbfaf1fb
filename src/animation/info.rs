use bitflags::bitflags;

/// Default playback speed in frames per second.
pub const DEFAULT_FRAME_SPEED: f32 = 24.0;

bitflags! {
    /// Playback behaviour at the end of the frame range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnimationFlags: u32 {
        /// Wrap around to the other end of the range
        const LOOP = 1 << 0;
        /// Reverse the playback direction at the end of the range
        const PING_PONG = 1 << 1;
    }
}

/// What an animation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationKind {
    /// Morph target weights
    #[default]
    Vertex,
    /// Joint states
    Skeleton,
}

/// Static description of a playable frame range.
///
/// Start and end frame are inclusive and may be given in reverse order.
/// The optional per-frame speed table scales the playback speed while the
/// animation is inside a frame: a negative speed disables interpolation into
/// the next frame, a speed of zero skips the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInfo {
    pub name: String,
    pub kind: AnimationKind,
    pub start_frame: u32,
    pub end_frame: u32,
    pub speed: f32,
    pub flags: AnimationFlags,
    frame_speeds: Vec<f32>,
}

impl AnimationInfo {
    #[must_use]
    pub fn new(name: &str, kind: AnimationKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            start_frame: 0,
            end_frame: 0,
            speed: DEFAULT_FRAME_SPEED,
            flags: AnimationFlags::empty(),
            frame_speeds: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_frames(mut self, start_frame: u32, end_frame: u32) -> Self {
        self.start_frame = start_frame;
        self.end_frame = end_frame;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: AnimationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Distance between start and end frame.
    #[inline]
    #[must_use]
    pub fn num_frames(&self) -> u32 {
        self.start_frame.abs_diff(self.end_frame)
    }

    /// Speed factor of the frame at `offset` from the lower range bound.
    /// `None` if no speed was set for that frame.
    #[must_use]
    pub fn frame_speed(&self, offset: u32) -> Option<f32> {
        self.frame_speeds.get(offset as usize).copied()
    }

    /// Sets the speed factor of the frame at `offset` from the lower range
    /// bound. Frames without an explicit factor play at factor 1.
    pub fn set_frame_speed(&mut self, offset: u32, speed: f32) {
        let index = offset as usize;
        if index >= self.frame_speeds.len() {
            self.frame_speeds.resize(index + 1, 1.0);
        }
        self.frame_speeds[index] = speed;
    }
}
