//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `biblioteca_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("biblioteca_core ping={}", biblioteca_core::ping());
    println!("biblioteca_core version={}", biblioteca_core::core_version());
}
