use almanac_infra_core::{InfraConfig, assemble};
use almanac_infra_synth::{
    CloudAssemblyWriter, ProvisioningTarget, TemplateFormat, render_stack, render_template,
};
use colored::Colorize;
use std::path::Path;

/// Write every template and the manifest to `out`
pub async fn handle(config: &InfraConfig, out: &Path, format: TemplateFormat) -> anyhow::Result<()> {
    let assembly = assemble(config)?;
    println!(
        "{} {}",
        "Synthesizing to".blue(),
        out.display().to_string().cyan()
    );

    let writer = CloudAssemblyWriter::new(out, format);
    let result = writer.submit(&assembly).await?;

    for stack in &result.succeeded {
        println!("  {} {} ({})", "✓".green(), stack.stack_name.cyan(), stack.message);
    }

    if let Some(manifest) = writer.load_manifest().await? {
        println!();
        println!("{} {}", "✓".green().bold(), manifest);
        if manifest.total_unresolved() > 0 {
            println!(
                "{}",
                "Run `almanac-infra validate` to see the unresolved references.".yellow()
            );
        }
    }
    Ok(())
}

/// Print templates to stdout: one JSON object keyed by stack name, or a
/// YAML document per stack.
pub fn print(config: &InfraConfig, format: TemplateFormat) -> anyhow::Result<()> {
    let assembly = assemble(config)?;
    match format {
        TemplateFormat::Json => {
            let templates: serde_json::Map<String, serde_json::Value> = assembly
                .stacks()
                .iter()
                .map(|stack| (stack.stack_name().to_string(), render_template(stack)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        TemplateFormat::Yaml => {
            for stack in assembly.stacks() {
                println!("---");
                print!("{}", render_stack(stack, format)?);
            }
        }
    }
    Ok(())
}
