//! Types command
//!
//! Lists the job types the built-in registry can execute.

use anyhow::Result;
use colored::*;
use marshal_runner::handlers::builtin_registry;

pub fn handle_types() -> Result<()> {
    let registry = builtin_registry();

    println!(
        "{}",
        format!("{} registered job type(s):", registry.len()).bold()
    );
    println!();
    for job_type in registry.job_types() {
        let description = registry
            .resolve(job_type)
            .map(|handler| handler.description())
            .unwrap_or_default();
        println!("  {:<16} {}", job_type.cyan(), description.dimmed());
    }

    Ok(())
}
