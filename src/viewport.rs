//! Auto-scroll policy for the message list.
//!
//! The controller never touches the DOM. It is fed scroll positions and
//! content sizes, and answers with a [`ScrollAction`] for the view to perform.

use std::time::Duration;

/// Distance from the bottom, in pixels, that still counts as "at bottom".
pub const BOTTOM_TOLERANCE_PX: f64 = 32.0;

/// Delay before scrolling after content grew, so the new content has been
/// laid out first.
pub const SCROLL_DEFER: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height - self.client_height - self.scroll_top).max(0.0)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.distance_from_bottom() <= BOTTOM_TOLERANCE_PX
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Stick to the newest content.
    #[default]
    FollowLatest,
    /// The user moved away; leave the viewport where it is.
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    None,
    ScrollToBottom { delay: Duration },
    ShowNewContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportController {
    mode: ScrollMode,
    at_bottom: bool,
    user_scrolling: bool,
    has_new_content: bool,
    last_scroll_top: f64,
    message_count: usize,
    content_len: usize,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
            at_bottom: true,
            user_scrolling: false,
            has_new_content: false,
            last_scroll_top: 0.0,
            message_count: 0,
            content_len: 0,
        }
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == ScrollMode::FollowLatest
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn user_scrolling(&self) -> bool {
        self.user_scrolling
    }

    /// Content arrived while the user was away from the bottom.
    pub fn has_new_content(&self) -> bool {
        self.has_new_content
    }

    /// Records a scroll event from the message list.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        if metrics.scroll_top < self.last_scroll_top {
            self.user_scrolling = true;
        }
        self.last_scroll_top = metrics.scroll_top;
        self.at_bottom = metrics.is_at_bottom();

        if self.at_bottom {
            self.mode = ScrollMode::FollowLatest;
            self.user_scrolling = false;
            self.has_new_content = false;
        } else {
            self.mode = ScrollMode::Detached;
        }
    }

    /// The user stopped scrolling (debounced by the view).
    pub fn on_scroll_end(&mut self) {
        self.user_scrolling = false;
    }

    /// Called after every state change with the size of what is rendered.
    pub fn on_content_change(&mut self, message_count: usize, content_len: usize) -> ScrollAction {
        let grew = message_count > self.message_count || content_len > self.content_len;
        self.message_count = message_count;
        self.content_len = content_len;
        if !grew {
            return ScrollAction::None;
        }

        if self.is_following() && self.at_bottom && !self.user_scrolling {
            ScrollAction::ScrollToBottom { delay: SCROLL_DEFER }
        } else {
            self.has_new_content = true;
            ScrollAction::ShowNewContent
        }
    }

    /// "Jump to bottom" control.
    pub fn jump_to_bottom(&mut self) -> ScrollAction {
        self.mode = ScrollMode::FollowLatest;
        self.at_bottom = true;
        self.user_scrolling = false;
        self.has_new_content = false;
        ScrollAction::ScrollToBottom { delay: Duration::ZERO }
    }

    /// Sending a message always brings the newest content into view.
    pub fn on_submit(&mut self) -> ScrollAction {
        self.jump_to_bottom()
    }

    /// A different chat is shown; start following it from its current size.
    pub fn reset(&mut self, message_count: usize, content_len: usize) -> ScrollAction {
        self.message_count = message_count;
        self.content_len = content_len;
        self.last_scroll_top = 0.0;
        self.jump_to_bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_top: f64) -> ScrollMetrics {
        ScrollMetrics { scroll_top, scroll_height: 2000.0, client_height: 500.0 }
    }

    #[test]
    fn follows_when_at_bottom() {
        let mut vp = ViewportController::new();
        vp.on_scroll(metrics(1500.0));
        assert!(vp.at_bottom());
        assert_eq!(
            vp.on_content_change(1, 10),
            ScrollAction::ScrollToBottom { delay: SCROLL_DEFER }
        );
        assert!(!vp.has_new_content());
    }

    #[test]
    fn away_from_bottom_raises_indicator_instead() {
        let mut vp = ViewportController::new();
        vp.on_scroll(metrics(1500.0));
        vp.on_scroll(metrics(600.0));
        assert!(!vp.at_bottom());
        assert_eq!(vp.mode(), ScrollMode::Detached);
        assert_eq!(vp.on_content_change(3, 40), ScrollAction::ShowNewContent);
        assert!(vp.has_new_content());
    }

    #[test]
    fn tolerance_counts_as_bottom() {
        assert!(metrics(1500.0 - BOTTOM_TOLERANCE_PX).is_at_bottom());
        assert!(!metrics(1500.0 - BOTTOM_TOLERANCE_PX - 1.0).is_at_bottom());
    }

    #[test]
    fn upward_scroll_near_bottom_blocks_auto_scroll_until_it_ends() {
        let mut vp = ViewportController::new();
        vp.on_scroll(metrics(1500.0));
        vp.on_scroll(metrics(1490.0));
        // Still within tolerance, so reaching "bottom" resets the flag.
        assert!(!vp.user_scrolling());

        vp.on_scroll(metrics(1200.0));
        assert!(vp.user_scrolling());
        assert_eq!(vp.on_content_change(1, 5), ScrollAction::ShowNewContent);
        vp.on_scroll_end();
        assert!(!vp.user_scrolling());
    }

    #[test]
    fn returning_to_bottom_resumes_following() {
        let mut vp = ViewportController::new();
        vp.on_scroll(metrics(100.0));
        vp.on_content_change(2, 20);
        assert!(vp.has_new_content());

        vp.on_scroll(metrics(1500.0));
        assert!(vp.is_following());
        assert!(!vp.has_new_content());
        assert!(matches!(vp.on_content_change(3, 30), ScrollAction::ScrollToBottom { .. }));
    }

    #[test]
    fn submit_and_jump_force_scroll() {
        let mut vp = ViewportController::new();
        vp.on_scroll(metrics(100.0));
        vp.on_content_change(2, 20);

        assert_eq!(vp.on_submit(), ScrollAction::ScrollToBottom { delay: Duration::ZERO });
        assert!(vp.is_following() && !vp.has_new_content());
    }

    #[test]
    fn unchanged_or_shrinking_content_does_nothing() {
        let mut vp = ViewportController::new();
        vp.on_content_change(4, 100);
        assert_eq!(vp.on_content_change(4, 100), ScrollAction::None);
        assert_eq!(vp.on_content_change(2, 50), ScrollAction::None);
    }
}
