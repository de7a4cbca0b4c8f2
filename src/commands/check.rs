//! Check command implementation.
//!
//! Validates configuration, socket access and runtime connectivity.

use container_state_exporter::{ContainerRuntime, DockerRuntime};

use crate::config::{validate_effective_config, Config};
use crate::startup_checks;

/// Validates system requirements and configuration.
pub async fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Container State Exporter - System Check");
    println!("==========================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n🔌 Checking docker socket...");
    match startup_checks::validate_requirements(config.docker_host.as_deref()) {
        Ok(_) => println!("   ✅ Socket checks passed"),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n🐳 Checking container runtime...");
    let runtime = DockerRuntime::connect(
        config.docker_host.as_deref(),
        config.runtime_timeout(),
        config.all_containers.unwrap_or(true),
    )?;
    match runtime.ping().await {
        Ok(()) => {
            println!("   ✅ Runtime answered ping");
            match runtime.list_container_ids().await {
                Ok(ids) => println!("   ✅ {} containers visible", ids.len()),
                Err(e) => {
                    println!("   ❌ Listing containers failed: {}", e);
                    all_ok = false;
                }
            }
        }
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
