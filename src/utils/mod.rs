//! Utility modules for plugin-center

pub mod fs;
