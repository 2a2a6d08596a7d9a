use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Single,
    Carousel,
    Grid,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Single, ViewMode::Carousel, ViewMode::Grid];

    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Single => "Single",
            ViewMode::Carousel => "Carousel",
            ViewMode::Grid => "Grid",
        }
    }
}

/// Study position within a set of flashcards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deck {
    pub view_mode: ViewMode,
    pub current_index: usize,
    pub show_answer: bool,
}

impl Deck {
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.show_answer = false;
    }

    pub fn flip(&mut self) {
        self.show_answer = !self.show_answer;
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.current_index = (self.current_index + 1) % len;
        self.show_answer = false;
    }

    pub fn prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.current_index = (self.current_index + len - 1) % len;
        self.show_answer = false;
    }

    pub fn jump_to(&mut self, index: usize, len: usize) {
        self.current_index = index.min(len.saturating_sub(1));
        self.show_answer = false;
    }

    /// Keeps the index in range after the card set changed size.
    pub fn clamp(&mut self, len: usize) {
        if self.current_index >= len {
            self.current_index = len.saturating_sub(1);
            self.show_answer = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_wraps_and_hides_answer() {
        let mut deck = Deck::default();
        deck.flip();
        deck.next(3);
        assert_eq!(deck.current_index, 1);
        assert!(!deck.show_answer);
        deck.next(3);
        deck.next(3);
        assert_eq!(deck.current_index, 0);
        deck.prev(3);
        assert_eq!(deck.current_index, 2);
    }

    #[test]
    fn empty_deck_never_moves() {
        let mut deck = Deck::default();
        deck.next(0);
        deck.prev(0);
        deck.jump_to(4, 0);
        assert_eq!(deck.current_index, 0);
    }

    #[test]
    fn clamp_after_shrink() {
        let mut deck = Deck { current_index: 4, show_answer: true, ..Deck::default() };
        deck.clamp(2);
        assert_eq!(deck.current_index, 1);
        assert!(!deck.show_answer);
    }

    #[test]
    fn changing_mode_hides_answer() {
        let mut deck = Deck::default();
        deck.flip();
        deck.set_mode(ViewMode::Grid);
        assert_eq!(deck.view_mode, ViewMode::Grid);
        assert!(!deck.show_answer);
    }
}
