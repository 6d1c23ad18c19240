//! Command line arguments and configuration layering

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use shared_protocol::SecureConfig;

#[derive(Parser, Debug)]
#[command(name = "sealed-echo", about = "Encrypted echo server and client")]
pub struct Args {
    /// Listen mode: serve on this port
    #[arg(short = 'l', long = "listen", value_name = "PORT")]
    pub listen: Option<u16>,

    /// Server port to dial (client mode)
    #[arg(required_unless_present = "listen")]
    pub port: Option<u16>,

    /// Message to send (client mode)
    #[arg(required_unless_present = "listen")]
    pub message: Option<String>,

    /// Host to dial in client mode
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// JSON file with a SecureConfig; flags below override it
    #[arg(long, env = "SEALED_ECHO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Largest plaintext accepted per message, in bytes
    #[arg(long, env = "SEALED_ECHO_MAX_MESSAGE_SIZE")]
    pub max_message_size: Option<usize>,

    /// Seconds allowed for the key exchange
    #[arg(long, env = "SEALED_ECHO_HANDSHAKE_TIMEOUT_SECS")]
    pub handshake_timeout_secs: Option<u64>,
}

impl Args {
    /// Defaults, then the config file, then flags and environment
    pub fn secure_config(&self) -> anyhow::Result<SecureConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => SecureConfig::default(),
        };

        if let Some(max) = self.max_message_size {
            config.max_message_size = max;
        }
        if let Some(secs) = self.handshake_timeout_secs {
            config.handshake_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Port and message for client mode
    pub fn client_target(&self) -> anyhow::Result<(u16, &str)> {
        match (self.port, self.message.as_deref()) {
            (Some(port), Some(message)) => Ok((port, message)),
            _ => bail!("usage: sealed-echo <port> <message>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_mode() {
        let args = Args::try_parse_from(["sealed-echo", "-l", "8080"]).unwrap();
        assert_eq!(args.listen, Some(8080));
        assert_eq!(args.secure_config().unwrap(), SecureConfig::default());
    }

    #[test]
    fn test_client_mode() {
        let args = Args::try_parse_from(["sealed-echo", "8080", "hello"]).unwrap();
        assert_eq!(args.listen, None);
        assert_eq!(args.client_target().unwrap(), (8080, "hello"));
        assert_eq!(args.host, "localhost");
    }

    #[test]
    fn test_client_requires_message() {
        assert!(Args::try_parse_from(["sealed-echo", "8080"]).is_err());
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::try_parse_from([
            "sealed-echo",
            "-l",
            "9000",
            "--max-message-size",
            "3072",
            "--handshake-timeout-secs",
            "2",
        ])
        .unwrap();
        let config = args.secure_config().unwrap();
        assert_eq!(config.max_message_size, 3072);
        assert_eq!(config.handshake_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("sealed-echo-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_message_size": 1024, "handshake_timeout": 7}"#).unwrap();

        let args = Args::try_parse_from([
            "sealed-echo",
            "-l",
            "9000",
            "--config",
            path.to_str().unwrap(),
            "--max-message-size",
            "2048",
        ])
        .unwrap();
        let config = args.secure_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.max_message_size, 2048);
        assert_eq!(config.handshake_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_invalid_size_rejected() {
        let args =
            Args::try_parse_from(["sealed-echo", "-l", "9000", "--max-message-size", "0"]).unwrap();
        assert!(args.secure_config().is_err());
    }
}
