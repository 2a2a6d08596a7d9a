pub mod chat;
pub mod flashcards;
pub mod sidebar;
