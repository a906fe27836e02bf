pub mod billing;
pub mod decision;
pub mod entries;
pub mod fans;
pub mod generate;
pub mod health;
pub mod insights;
pub mod profile;
pub mod views;
pub mod ws;
