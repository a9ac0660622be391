// src/lib.rs
pub mod config;
pub mod drivers;
pub mod emulator;
pub mod engine;
pub mod gui;
pub mod recorder;
pub mod types;
