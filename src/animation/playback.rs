use crate::animation::info::{AnimationFlags, AnimationInfo, AnimationKind, DEFAULT_FRAME_SPEED};

/// Playback state of one animation on one mesh handler.
///
/// The frame position is a float inside `[min(start, end), max(start, end)]`.
/// Negative speeds play the range backwards. The integer frames used for
/// sampling are [`current_frame`](Self::current_frame) and
/// [`next_frame`](Self::next_frame), blended by [`progress`](Self::progress).
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    active: bool,
    running: bool,
    kind: AnimationKind,
    flags: AnimationFlags,
    start: u32,
    end: u32,
    speed: f32,
    info: Option<AnimationInfo>,
    weight: f32,
    bounced: bool,
    frame: f32,
}

impl Animation {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            active: false,
            running: false,
            kind: AnimationKind::default(),
            flags: AnimationFlags::empty(),
            start: 0,
            end: 0,
            speed: DEFAULT_FRAME_SPEED,
            info: None,
            weight: 1.0,
            bounced: false,
            frame: 0.0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Back to the freshly constructed state.
    pub fn reset(&mut self) {
        let name = std::mem::take(&mut self.name);
        *self = Self::new(&name);
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Starts playing the frame range `start..=end`.
    pub fn start(&mut self, start: u32, end: u32, speed: f32, flags: AnimationFlags) {
        self.active = true;
        self.running = true;
        self.flags = flags;
        self.start = start;
        self.end = end;
        self.speed = speed;
        self.info = None;
        self.bounced = false;
        self.set_current_frame(start as f32);
    }

    /// Starts playing the range described by `info`.
    ///
    /// Unless `restart` is set, starting the animation that is already
    /// playing keeps its current position.
    pub fn start_with_info(&mut self, info: &AnimationInfo, restart: bool) {
        if !restart && self.info.as_ref() == Some(info) {
            return;
        }
        self.active = true;
        self.running = true;
        self.kind = info.kind;
        self.flags = info.flags;
        self.start = info.start_frame;
        self.end = info.end_frame;
        self.speed = info.speed;
        self.info = Some(info.clone());
        self.bounced = false;
        self.set_current_frame(info.start_frame as f32);
    }

    pub fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.running = false;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continues a paused animation. Single frame ranges stay paused.
    pub fn resume(&mut self) {
        if self.start != self.end {
            self.running = true;
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: AnimationKind) {
        self.kind = kind;
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> AnimationFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: AnimationFlags) {
        self.flags = flags;
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// The animation description this playback was started with.
    #[must_use]
    pub fn info(&self) -> Option<&AnimationInfo> {
        self.info.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn start_frame(&self) -> u32 {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn end_frame(&self) -> u32 {
        self.end
    }

    #[inline]
    #[must_use]
    pub fn num_frames(&self) -> u32 {
        self.start.abs_diff(self.end)
    }

    fn bounds(&self) -> (u32, u32) {
        (self.start.min(self.end), self.start.max(self.end))
    }

    fn frame_speed(&self) -> Option<f32> {
        let (lower, _) = self.bounds();
        let offset = (self.frame - lower as f32).max(0.0) as u32;
        self.info.as_ref()?.frame_speed(offset)
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Frame position used for sampling. Frames with a negative speed
    /// factor are not interpolated.
    #[must_use]
    pub fn frame(&self) -> f32 {
        match self.frame_speed() {
            Some(speed) if speed < 0.0 => self.frame.floor(),
            _ => self.frame,
        }
    }

    /// Blend factor from [`current_frame`](Self::current_frame) towards
    /// [`next_frame`](Self::next_frame), in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        (self.frame() - self.current_frame() as f32).abs()
    }

    /// Integer frame the playback is currently in.
    #[must_use]
    pub fn current_frame(&self) -> u32 {
        if self.speed >= 0.0 {
            self.frame as u32
        } else {
            let (_, upper) = self.bounds();
            (self.frame as u32 + 1).min(upper)
        }
    }

    /// Sets the frame position, clamped to the frame range. Returns `true`
    /// if the position changed.
    pub fn set_current_frame(&mut self, frame: f32) -> bool {
        let (lower, upper) = self.bounds();
        let frame = frame.clamp(lower as f32, upper as f32);
        if self.frame == frame {
            return false;
        }
        self.frame = frame;
        true
    }

    /// Integer frame the playback is heading to, honouring loop and
    /// ping-pong behaviour at the range ends.
    #[must_use]
    pub fn next_frame(&self) -> u32 {
        if self.start == self.end {
            return self.start;
        }
        let (lower, upper) = self.bounds();
        let (lower, upper) = (i64::from(lower), i64::from(upper));
        let ping_pong = self.flags.contains(AnimationFlags::PING_PONG);
        let looping = self.flags.contains(AnimationFlags::LOOP);

        let next = if self.speed >= 0.0 {
            let next = self.frame as i64 + 1;
            if next <= upper {
                next
            } else if ping_pong && (looping || !self.bounced) {
                upper - 1
            } else if ping_pong || !looping {
                upper
            } else {
                lower
            }
        } else {
            let next = self.frame as i64;
            if next >= lower {
                next
            } else if ping_pong && (looping || !self.bounced) {
                lower + 1
            } else if ping_pong || !looping {
                lower
            } else {
                upper
            }
        };
        next.clamp(lower, upper) as u32
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Advances the playback by `dt` seconds. Returns `true` if the frame
    /// position changed.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.running || self.start == self.end || self.speed == 0.0 {
            return false;
        }

        let previous = self.frame;
        let (lower, upper) = self.bounds();
        let (lower, upper) = (lower as f32, upper as f32);

        let step = match self.frame_speed() {
            Some(speed) if speed == 0.0 => 1.0,
            Some(speed) => dt * speed.abs(),
            None => dt,
        };
        self.frame += step * self.speed;

        let ping_pong = self.flags.contains(AnimationFlags::PING_PONG);
        let looping = self.flags.contains(AnimationFlags::LOOP);

        if self.speed >= 0.0 {
            if self.frame >= upper {
                if ping_pong {
                    self.frame = upper;
                    self.bounce(looping);
                } else if looping {
                    self.frame = lower + (self.frame - lower).rem_euclid(upper - lower);
                } else {
                    self.frame = upper;
                    self.stop();
                }
            }
        } else if self.frame <= lower {
            if ping_pong {
                self.frame = lower;
                self.bounce(looping);
            } else if looping {
                self.frame = upper - (upper - self.frame).rem_euclid(upper - lower);
            } else {
                self.frame = lower;
                self.stop();
            }
        }

        previous != self.frame
    }

    // Reverses direction, or stops a non-looping ping-pong on its second end.
    fn bounce(&mut self, looping: bool) {
        if !looping && self.bounced {
            self.stop();
        } else {
            self.speed = -self.speed;
            self.bounced = true;
        }
    }
}
