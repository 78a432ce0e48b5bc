//! `chaos show` command implementation.

use anyhow::{Context, Result};

use chaos_core::App;

/// Pretty-printed template of `name`.
pub fn render(app: &App, name: &str) -> Result<String> {
    let Some(stack) = app.stack(name) else {
        let known: Vec<_> = app.stacks().iter().map(|s| s.name()).collect();
        anyhow::bail!("Unknown stack '{}'. Known stacks: {}", name, known.join(", "));
    };

    let template = stack
        .to_template_json()
        .with_context(|| format!("Failed to render stack '{}'", name))?;
    Ok(serde_json::to_string_pretty(&template)?)
}

pub fn run(app: &App, name: &str) -> Result<()> {
    println!("{}", render(app, name)?);
    Ok(())
}
