//! `chaos list` command implementation.

use chaos_core::App;

/// One line per stack: name, environment and resource count.
pub fn lines(app: &App) -> Vec<String> {
    app.stacks()
        .iter()
        .map(|stack| {
            format!(
                "{:<28} {:<40} {} resources",
                stack.name(),
                stack.context().environment().to_string(),
                stack.template().resource_count()
            )
        })
        .collect()
}

pub fn run(app: &App) {
    if app.stacks().is_empty() {
        println!("No stacks. Every demo is disabled in the configuration.");
        return;
    }

    println!("📦 Stacks ({}):", app.stacks().len());
    for line in lines(app) {
        println!("  {}", line);
    }
}
