//! Rotation state: which slide is active and whether navigation is allowed.
//!
//! Pure bookkeeping with no timers or dates; [`super::Slideshow`] drives it.

/// Index and flags of a slideshow rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    len: usize,
    current: usize,
    playing: bool,
    transitioning: bool,
    hovering: bool,
}

impl Rotation {
    /// A playing rotation over `len` slides, starting at the first.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            current: 0,
            playing: true,
            transitioning: false,
            hovering: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    /// Move to the next slide, wrapping. Returns true when the index changed.
    pub fn advance(&mut self) -> bool {
        if !self.can_navigate() {
            return false;
        }
        self.move_to((self.current + 1) % self.len)
    }

    /// Move to the previous slide, wrapping. Returns true when the index changed.
    pub fn retreat(&mut self) -> bool {
        if !self.can_navigate() {
            return false;
        }
        self.move_to((self.current + self.len - 1) % self.len)
    }

    /// Jump to `index`. Returns true when the index changed.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if !self.can_navigate() || index >= self.len {
            return false;
        }
        self.move_to(index)
    }

    /// Flip the play flag only; autoplay supervision reacts to it.
    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn set_hovering(&mut self, hovering: bool) {
        self.hovering = hovering;
    }

    /// Release the transition lock at the end of the cooldown.
    pub fn finish_transition(&mut self) {
        self.transitioning = false;
    }

    /// Adopt a new slide count, keeping the index when it is still valid.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        if self.current >= len {
            self.current = 0;
        }
    }

    /// Whether an autoplay timer should be running.
    pub fn wants_autoplay(&self) -> bool {
        self.playing && !self.hovering && !self.transitioning && self.len >= 2
    }

    fn can_navigate(&self) -> bool {
        !self.transitioning && self.len > 0
    }

    fn move_to(&mut self, index: usize) -> bool {
        // Wrapping onto the active slide (single slide, or a jump to self) is a no-op
        if index == self.current {
            return false;
        }
        self.current = index;
        self.transitioning = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps_after_len_steps() {
        for len in 2..7 {
            let mut rotation = Rotation::new(len);
            for _ in 0..len {
                assert!(rotation.advance());
                rotation.finish_transition();
            }
            assert_eq!(rotation.current(), 0, "len {}", len);
        }
    }

    #[test]
    fn test_retreat_wraps_backwards() {
        let mut rotation = Rotation::new(3);
        assert!(rotation.retreat());
        assert_eq!(rotation.current(), 2);
    }

    #[test]
    fn test_navigation_ignored_while_transitioning() {
        let mut rotation = Rotation::new(4);
        assert!(rotation.advance());
        assert!(rotation.is_transitioning());

        assert!(!rotation.advance());
        assert!(!rotation.retreat());
        assert!(!rotation.jump_to(3));
        assert_eq!(rotation.current(), 1);

        rotation.finish_transition();
        assert!(rotation.jump_to(3));
        assert_eq!(rotation.current(), 3);
    }

    #[test]
    fn test_jump_to_current_is_noop() {
        let mut rotation = Rotation::new(3);
        assert!(!rotation.jump_to(0));
        assert!(!rotation.is_transitioning());

        rotation.advance();
        assert!(!rotation.jump_to(1));
        assert_eq!(rotation.current(), 1);
    }

    #[test]
    fn test_jump_out_of_range_is_noop() {
        let mut rotation = Rotation::new(3);
        assert!(!rotation.jump_to(3));
        assert_eq!(rotation.current(), 0);
    }

    #[test]
    fn test_empty_and_single_slide() {
        let mut empty = Rotation::new(0);
        assert!(!empty.advance());
        assert!(!empty.retreat());
        assert!(!empty.wants_autoplay());

        let mut single = Rotation::new(1);
        assert!(!single.advance());
        assert!(!single.retreat());
        assert_eq!(single.current(), 0);
        assert!(!single.is_transitioning());
        assert!(!single.wants_autoplay());
    }

    #[test]
    fn test_toggle_and_hover_drive_autoplay() {
        let mut rotation = Rotation::new(2);
        assert!(rotation.wants_autoplay());

        rotation.set_hovering(true);
        assert!(!rotation.wants_autoplay());
        assert!(rotation.is_playing());
        rotation.set_hovering(false);

        assert!(!rotation.toggle_play());
        assert!(!rotation.wants_autoplay());
        assert!(rotation.toggle_play());
        assert!(rotation.wants_autoplay());
    }

    #[test]
    fn test_reset_clamps_index() {
        let mut rotation = Rotation::new(5);
        rotation.jump_to(4);
        rotation.finish_transition();

        rotation.reset(6);
        assert_eq!(rotation.current(), 4);
        rotation.reset(2);
        assert_eq!(rotation.current(), 0);
    }
}
