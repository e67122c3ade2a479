use anyhow::Result;

use newswire_core::scheduler::SourceRegistry;

/// Print the registered sources and their state
pub fn run(registry: &SourceRegistry) -> Result<()> {
    println!("{:<12} {:<12} {:<8} {:<9} countries", "ID", "NAME", "KIND", "ENABLED");

    for source in registry.all() {
        let info = source.info();
        println!(
            "{:<12} {:<12} {:<8} {:<9} {}",
            info.id,
            info.name,
            info.kind.as_str(),
            if info.enabled { "yes" } else { "no" },
            info.countries.join(", ")
        );
    }

    Ok(())
}
