use almanac_infra_core::{InfraConfig, assemble};
use colored::Colorize;

pub fn handle(config: &InfraConfig) -> anyhow::Result<()> {
    let assembly = assemble(config)?;

    if assembly.environments().is_empty() {
        println!("{}", "No stages configured".yellow());
        return Ok(());
    }

    for env in assembly.environments() {
        println!(
            "{} {} ({})",
            env.stage_name().cyan().bold(),
            env.environment_uri(),
            env.deployment()
        );
        for stack in assembly.stacks().iter().filter(|s| s.environment() == env) {
            println!("  - {}", stack.stack_name());
        }
    }
    Ok(())
}
