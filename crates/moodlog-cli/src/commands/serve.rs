//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

/// Split a comma-separated environment variable into trimmed, non-empty items
fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn describe_networks(networks: &[moodlog_server::IpNet]) -> String {
    networks
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Moodlog web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // API keys from environment (comma-separated)
    let api_keys = env_list("MOODLOG_API_KEYS");

    // Trusted networks (for local network access without auth)
    let trusted_networks_str = std::env::var("MOODLOG_TRUSTED_NETWORKS").unwrap_or_default();
    let trusted_networks = moodlog_server::parse_trusted_networks(&trusted_networks_str);

    // Trusted proxies (for extracting real client IP behind reverse proxies)
    let trusted_proxies_str = std::env::var("MOODLOG_TRUSTED_PROXIES").unwrap_or_default();
    let trusted_proxies = moodlog_server::parse_trusted_networks(&trusted_proxies_str);

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: Cloudflare Access (header)");
        if !api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (MOODLOG_API_KEYS)",
                api_keys.len()
            );
        }
        if !trusted_networks.is_empty() {
            println!(
                "   🏠 Trusted networks: {} (MOODLOG_TRUSTED_NETWORKS)",
                describe_networks(&trusted_networks)
            );
        }
        if !trusted_proxies.is_empty() {
            println!(
                "   🔀 Trusted proxies: {} (MOODLOG_TRUSTED_PROXIES)",
                describe_networks(&trusted_proxies)
            );
        }
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let config = moodlog_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins: env_list("MOODLOG_ALLOWED_ORIGINS"),
        api_keys,
        trusted_networks,
        trusted_proxies,
    };

    let static_dir_str = static_dir
        .map(|p| {
            p.to_str()
                .with_context(|| format!("Static dir path is not valid UTF-8: {}", p.display()))
        })
        .transpose()?;
    moodlog_server::serve_with_config(db, host, port, static_dir_str, config).await?;

    Ok(())
}
