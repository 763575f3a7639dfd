//! Integration Tests Runner
//!
//! This binary can be used to run specific integration tests with proper setup

use anyhow::Result;

fn main() -> Result<()> {
    println!("Plinth Integration Tests");
    println!("========================");
    println!();
    println!("Available tests:");
    println!("  - Persistence Flow: cargo test --test persistence_flow -- --nocapture");
    println!();
    println!("To run all integration tests:");
    println!("  cargo test -- --nocapture");
    println!();
    println!("Note: the flow tests run entirely against the in-memory store and");
    println!("      executor, so no external backend needs to be running.");

    Ok(())
}
