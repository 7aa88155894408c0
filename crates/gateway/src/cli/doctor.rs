use pax_domain::config::{Config, ConfigSeverity};

/// Runs all diagnostic checks and prints a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least one
/// check failed.
pub async fn run(config: &Config) -> anyhow::Result<bool> {
    println!("pax-gateway doctor");
    println!("==================\n");

    let mut all_passed = true;

    check_config_validation(config, &mut all_passed);
    check_state_path(config, &mut all_passed);
    check_port_available(config, &mut all_passed).await;
    check_tool_registry(&mut all_passed);

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({error_count} error(s))", issues.len()),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

fn check_state_path(config: &Config, all_passed: &mut bool) {
    let path = std::path::Path::new(&config.storage.state_path);
    if let Err(e) = std::fs::create_dir_all(path) {
        print_check("State path writable", false, format!("{}: {e}", path.display()));
        *all_passed = false;
        return;
    }

    let probe = path.join(".pax_doctor_probe");
    let writable = std::fs::write(&probe, b"probe").is_ok();
    let _ = std::fs::remove_file(&probe);

    print_check(
        "State path writable",
        writable,
        if writable {
            format!("{} (writable)", path.display())
        } else {
            format!("{} (not writable)", path.display())
        },
    );
    if !writable {
        *all_passed = false;
    }
}

async fn check_port_available(config: &Config, all_passed: &mut bool) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let available = tokio::net::TcpListener::bind(&addr).await.is_ok();
    print_check(
        "Port available",
        available,
        if available {
            addr
        } else {
            format!("{addr} (already in use)")
        },
    );
    if !available {
        *all_passed = false;
    }
}

fn check_tool_registry(all_passed: &mut bool) {
    let registry = pax_tools::seeded_registry();
    let names = registry.list_names();
    let ok = !names.is_empty();
    print_check(
        "Tool registry seeded",
        ok,
        if ok {
            format!("{} built-in tool(s): {}", names.len(), names.join(", "))
        } else {
            "no tools registered".into()
        },
    );
    if !ok {
        *all_passed = false;
    }
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_passes_every_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().join("state").display().to_string();
        config.server.port = 0;
        let free_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        config.server.port = free_port;

        let passed = run(&config).await.unwrap();
        assert!(passed);
    }

    #[tokio::test]
    async fn port_in_use_fails_the_check() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.state_path = dir.path().display().to_string();
        config.server.port = port;

        let passed = run(&config).await.unwrap();
        assert!(!passed);
        drop(listener);
    }
}
