pub mod basics;
pub mod editor;
pub mod listeners;
