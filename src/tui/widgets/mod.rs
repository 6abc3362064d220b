pub mod dashboard;
pub mod deck_detail;
pub mod decks;
pub mod study;
