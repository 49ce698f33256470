use std::collections::BTreeMap;

use sysinfo::System;

/// Describe the machine the sweep is running on.
///
/// Entries in `extra` are added last and replace captured entries with the same key.
pub(crate) fn capture(extra: &[(String, String)]) -> BTreeMap<String, String> {
    let mut system = System::new();
    system.refresh_cpu_all();
    system.refresh_memory();

    let mut environment = BTreeMap::new();
    environment.insert(
        "platform".to_string(),
        format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
    );
    if let Some(os_version) = System::long_os_version() {
        environment.insert("os_version".to_string(), os_version);
    }
    if let Some(host_name) = System::host_name() {
        environment.insert("host_name".to_string(), host_name);
    }
    if let Some(cpu) = system.cpus().first() {
        environment.insert("cpu_brand".to_string(), cpu.brand().trim().to_string());
    }
    environment.insert("cpu_count".to_string(), system.cpus().len().to_string());
    environment.insert(
        "total_memory_bytes".to_string(),
        system.total_memory().to_string(),
    );
    environment.insert(
        "frame_tunnel_version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );

    for (key, value) in extra {
        environment.insert(key.clone(), value.clone());
    }

    environment
}
