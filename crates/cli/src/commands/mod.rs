pub mod config;
pub mod console;
pub mod doctor;
pub mod memory;
