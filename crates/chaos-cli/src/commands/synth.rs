//! `chaos synth` command implementation.

use anyhow::{Context, Result};
use std::path::Path;

use chaos_core::{App, MANIFEST_FILE, Manifest};

/// Synthesize the selected stacks into `out_dir`.
pub fn run(app: &App, out_dir: &Path, stacks: &[String]) -> Result<Manifest> {
    println!("🔨 Synthesizing into {}...", out_dir.display());

    let manifest = app
        .synth(out_dir, stacks)
        .with_context(|| format!("Failed to synthesize into {}", out_dir.display()))?;

    for (name, artifact) in &manifest.artifacts {
        println!(
            "  ✅ {} → {} ({} resources)",
            name, artifact.template_file, artifact.resource_count
        );
    }
    println!();
    println!(
        "📁 Wrote {} template(s) and {}",
        manifest.artifacts.len(),
        MANIFEST_FILE
    );

    Ok(manifest)
}
