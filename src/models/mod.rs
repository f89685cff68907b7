pub mod class_entry;

pub use class_entry::{ClassEntry, DEFAULT_REMINDER_MINUTES};
