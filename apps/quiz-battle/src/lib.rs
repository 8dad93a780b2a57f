//! Quiz Battle - Timed quiz battles against a simulated opponent.

pub mod adaptive;
pub mod app;
pub mod bank;
pub mod battle;
pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod opponent;
pub mod scoring;
pub mod summary;
pub mod ui;
