use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration instead.
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
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "KOPI_HOST",
        "KOPI_PORT",
        "KOPI_DATABASE_URL",
        "KOPI_USE_X_FORWARDED_FOR",
        "KOPI_USE_FORWARDED",
        "KOPI_SHIPPING_FEE_PER_SELLER",
        "KOPI_MIDTRANS_CLIENT_KEY",
        "KOPI_MIDTRANS_IS_PRODUCTION",
        "KOPI_MIDTRANS_TIMEOUT_SECS",
        "KOPI_MIDTRANS_IP_WHITELIST",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
