pub mod navigation;
pub mod persistence;
pub mod random_edits;
