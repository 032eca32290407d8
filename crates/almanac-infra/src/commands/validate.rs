use almanac_infra_core::{InfraConfig, assemble};
use almanac_infra_synth::ResourceSet;
use colored::Colorize;

/// Assemble and report. Configuration gaps are warnings; only a topology
/// that cannot be built fails.
pub fn handle(config: &InfraConfig) -> anyhow::Result<()> {
    println!("{}", "Validating stacks...".blue());

    let assembly = match assemble(config) {
        Ok(assembly) => assembly,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Topology error".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    let mut unresolved_total = 0;
    for stack in assembly.stacks() {
        let set = ResourceSet::from_topology(stack)?;
        let types = set
            .type_counts()
            .iter()
            .map(|(t, n)| format!("{} {}", t, n))
            .collect::<Vec<_>>()
            .join(", ");

        println!();
        println!("{} {}", stack.stack_name().cyan().bold(), stack.environment().environment_uri());
        println!("  resources: {} ({})", set.len(), types);
        for (from, to) in stack.routes() {
            println!("  route: {} -> {}", from, to);
        }
        for grant in stack.access_grants() {
            println!("  grant: {} -> {} [{}]", grant.principal, grant.target, grant.access);
        }

        let unresolved = stack.unresolved_references();
        unresolved_total += unresolved.len();
        for reference in &unresolved {
            println!("  {} unresolved: {}", "⚠".yellow(), reference);
        }
    }

    println!();
    if unresolved_total == 0 {
        println!("{}", "✓ All stacks are complete".green().bold());
    } else {
        println!(
            "{}",
            format!(
                "✓ {} stack(s) built; {} unresolved reference(s) will be rejected by the provisioning engine",
                assembly.stacks().len(),
                unresolved_total
            )
            .yellow()
        );
    }
    Ok(())
}
