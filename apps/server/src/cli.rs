use std::path::PathBuf;

use clap::Parser;

/// Target list used when neither `--conf` nor `SITECHECK_CONF` is given,
/// overridable at build time through `.env`
const DEFAULT_CONF: &str = match option_env!("SITECHECK_DEFAULT_CONF") {
    Some(path) => path,
    None => "sitecheck.toml",
};

/// Health dashboard for heterogeneous network services
#[derive(Debug, Parser)]
#[command(name = "sitecheck-server", version, about)]
pub struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value_t = 8080, env = "SITECHECK_PORT")]
    pub port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "SITECHECK_BIND")]
    pub bind: String,

    /// Target list
    #[arg(short, long, default_value = DEFAULT_CONF, env = "SITECHECK_CONF")]
    pub conf: PathBuf,

    /// Default per-target timeout in seconds
    #[arg(short, long, default_value_t = sitecheck::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Minimum seconds between two refreshes of the same configuration
    #[arg(long, default_value_t = sitecheck::DEFAULT_DEBOUNCE_SECS)]
    pub debounce: u64,

    /// Seconds between background refreshes, 0 disables them
    #[arg(long, default_value_t = 60)]
    pub refresh_interval: u64,

    /// Directory holding cert.pem, key.pem and ca.pem for docker/swarm
    #[arg(long, env = "DOCKER_CERT_PATH")]
    pub docker_cert_path: Option<PathBuf>,

    /// Subversion client binary
    #[arg(long, default_value = "svn")]
    pub svn: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sitecheck-server"]).unwrap();
        assert_eq!(args.timeout, 20);
        assert_eq!(args.debounce, 60);
        assert_eq!(args.svn, PathBuf::from("svn"));
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "sitecheck-server",
            "--port",
            "9090",
            "--conf",
            "/etc/sitecheck.toml",
            "--refresh-interval",
            "0",
            "--docker-cert-path",
            "/certs",
        ])
        .unwrap();

        assert_eq!(args.port, 9090);
        assert_eq!(args.conf, PathBuf::from("/etc/sitecheck.toml"));
        assert_eq!(args.refresh_interval, 0);
        assert_eq!(args.docker_cert_path, Some(PathBuf::from("/certs")));
    }
}
