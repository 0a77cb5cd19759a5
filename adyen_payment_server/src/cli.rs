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
    // Keys, passwords and tokens are never listed here
    const DISPLAY_ENVS: [&str; 21] = [
        "RUST_LOG",
        "APG_HOST",
        "APG_PORT",
        "APG_DATABASE_URL",
        "APG_USE_X_FORWARDED_FOR",
        "APG_USE_FORWARDED",
        "APG_ADYEN_IP_WHITELIST",
        "APG_NOTIFICATION_INTERVAL",
        "APG_NOTIFICATION_BATCH_SIZE",
        "APG_NOTIFICATION_DELAY",
        "APG_NOTIFICATION_MAX_ERRORS",
        "APG_SALES_CHANNELS",
        "APG_ADYEN_ENVIRONMENT",
        "APG_ADYEN_MERCHANT_ACCOUNT",
        "APG_ADYEN_NOTIFICATION_USERNAME",
        "APG_ADYEN_LIVE_ENDPOINT_PREFIX",
        "APG_ADYEN_MANUAL_CAPTURE",
        "APG_ADYEN_CAPTURE_DELIVERY_STATE",
        "APG_ADYEN_DONATION_ACCOUNT",
        "APG_ADYEN_CHECKOUT_URL",
        "APG_ADYEN_PAYMENT_URL",
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
