// siphon-rs - The Siphon SIP Stack
// Copyright (C) 2025 James Ferris <ferrous.communications@gmail.com>
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use siphon_trap::{HoneypotConfig, Honeypot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Low-interaction SIP honeypot that accepts calls and records their RTP
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; flags and environment override its values
    #[arg(long, env = "SIPHON_TRAP_CONFIG")]
    config: Option<PathBuf>,
    /// SIP listen address (UDP)
    #[arg(long, env = "SIPHON_TRAP_BIND")]
    bind: Option<SocketAddr>,
    /// Local SIP user to impersonate
    #[arg(long, env = "SIPHON_TRAP_USER")]
    user: Option<String>,
    /// IP placed in Contact and the SDP answer
    #[arg(long, env = "SIPHON_TRAP_ADVERTISED_IP")]
    advertised_ip: Option<IpAddr>,
    /// Port placed in Contact
    #[arg(long, env = "SIPHON_TRAP_ADVERTISED_PORT")]
    advertised_port: Option<u16>,
    /// User-Agent header value
    #[arg(long, env = "SIPHON_TRAP_USER_AGENT")]
    user_agent: Option<String>,
    /// Digest secret accepted for any username
    #[arg(long, env = "SIPHON_TRAP_SECRET")]
    secret: Option<String>,
    /// Challenge INVITEs with 401 before accepting them
    #[arg(long, env = "SIPHON_TRAP_AUTH")]
    auth: bool,
    /// Digest realm (defaults to <user>@localhost)
    #[arg(long, env = "SIPHON_TRAP_REALM")]
    realm: Option<String>,
    /// Directory for RTP capture artifacts
    #[arg(long, env = "SIPHON_TRAP_CAPTURE_DIR")]
    capture_dir: Option<PathBuf>,
    /// Interface per-call RTP sockets bind to
    #[arg(long, env = "SIPHON_TRAP_RTP_BIND")]
    rtp_bind: Option<IpAddr>,
}

impl Args {
    /// Defaults, then the config file, then flags.
    fn into_config(self) -> Result<HoneypotConfig> {
        let mut config = match &self.config {
            Some(path) => HoneypotConfig::from_file(path)?,
            None => HoneypotConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(user) = self.user {
            config.user = user;
        }
        if self.advertised_ip.is_some() {
            config.advertised_ip = self.advertised_ip;
        }
        if self.advertised_port.is_some() {
            config.advertised_port = self.advertised_port;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(secret) = self.secret {
            config.secret = secret;
        }
        if self.auth {
            config.auth_enabled = true;
        }
        if self.realm.is_some() {
            config.realm = self.realm;
        }
        if let Some(dir) = self.capture_dir {
            config.capture_dir = dir;
        }
        if let Some(ip) = self.rtp_bind {
            config.rtp_bind = ip;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
/// Entry point for the honeypot daemon.
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Args::parse().into_config()?;
    let honeypot = Honeypot::bind(config).await?;
    info!(
        "siphon-trap started on udp {}, advertising {}",
        honeypot.local_addr()?,
        honeypot.advertised_addr()
    );

    honeypot
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(%e, "cannot listen for ctrl-c; running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "siphon-trap",
            "--bind",
            "127.0.0.1:5070",
            "--user",
            "2000",
            "--auth",
            "--capture-dir",
            "/tmp/caps",
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.bind, "127.0.0.1:5070".parse().unwrap());
        assert_eq!(config.user, "2000");
        assert!(config.auth_enabled);
        assert_eq!(config.realm(), "2000@localhost");
        assert_eq!(config.capture_dir, PathBuf::from("/tmp/caps"));
        assert_eq!(config.user_agent, "softphone");
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "user": "300", "secret": "from-file" }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let args =
            Args::try_parse_from(["siphon-trap", "--config", &path, "--secret", "from-flag"])
                .unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.user, "300");
        assert_eq!(config.secret, "from-flag");
    }
}
