pub mod entry;
pub mod fan;
pub mod insight;
pub mod locale;
pub mod mood;
pub mod user;
