use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "MKT_HOST",
        "MKT_PORT",
        "MKT_DATABASE_URL",
        "MKT_APP_URL",
        "MKT_API_URL",
        "MKT_MERCADOPAGO_API_URL",
        "MKT_GATEWAY_TIMEOUT_SECS",
        "MKT_WEBHOOK_SIGNATURE_CHECKS",
        "MKT_CHAT_LIST_LIMIT_CAP",
        "MKT_OUTBOX_POLL_INTERVAL_SECS",
        "MKT_OUTBOX_MAX_ATTEMPTS",
        "MKT_MERCADOPAGO_ACCESS_TOKEN",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(_) if is_secret(name) => "Set".into(),
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

/// Secrets are reported as set or not set, never printed
fn is_secret(name: &str) -> bool {
    name.ends_with("_TOKEN") || name.ends_with("_SECRET")
}
