//! Platform-specific accessibility providers.

#[cfg(target_os = "windows")]
pub mod windows;
