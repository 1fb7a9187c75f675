use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use e2n_adapters::AdapterRegistry;

pub(crate) fn run_adapters(registry: &AdapterRegistry) {
    log::info!("Registered adapters:");
    log::info!("");
    for adapter in registry.adapters() {
        log::info!(
            "  {}{}",
            adapter.name().if_supports_color(Stdout, |t| t.bold()),
            if adapter.scan_only() {
                format!(" {}", "(scan)".if_supports_color(Stdout, |t| t.cyan()))
            } else {
                String::new()
            },
        );
        log::info!("    {}", adapter.description());
    }
}
