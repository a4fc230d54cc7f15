//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use secrecy::SecretString;

use crate::transport::HostKeyPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "lunadm",
    version,
    disable_version_flag = true,
    about = "LUN Administration Utility",
    long_about = "lunadm manages LUNs on a storage controller.\nIt connects to the controller over SSH or Telnet, runs one `lun` command and prints the controller's answer.",
    after_help = "EXAMPLES:\n  Show all LUNs:          lunadm show -t root@filer01\n  Show mapped LUNs:       lunadm show -t filer01 --mapped\n  Add a LUN:              lunadm add -t root@filer01 --size 10g /vol/vol0/lun1\n  Run a raw command:      lunadm show -t filer01 -c \"lun stats\"\n  Use Telnet:             lunadm show -t filer01 -p telnet\n\nENVIRONMENT:\n  LUNADM_PASSWORD         Password to use instead of prompting"
)]
pub struct Cli {
    #[arg(short = 'v', long, action = ArgAction::Version, help = "Print version")]
    version: Option<bool>,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<LunCommand>,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Enable verbose messages")]
    pub verbose: bool,

    #[arg(
        short = 't',
        long,
        global = true,
        value_name = "TARGET",
        help = "Target in [user@]host[:port] format"
    )]
    pub target: Option<String>,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "COMMAND",
        help = "Execute this command on the target instead of the generated one"
    )]
    pub command: Option<String>,

    #[arg(
        short = 'p',
        long,
        global = true,
        default_value = "SSH",
        help = "Connection type (SSH, TELNET, RSH, ZAPI, HTTP)"
    )]
    pub protocol: String,

    #[arg(
        long,
        global = true,
        value_name = "SECS",
        help = "Connect and command timeout in seconds (0 for unlimited)"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "known_hosts file to use instead of ~/.ssh/known_hosts"
    )]
    pub known_hosts: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = "accept-new",
        help = "Host key checking mode (yes/no/accept-new)\n  yes        - Reject hosts missing from known_hosts\n  no         - Accept all host keys (testing only)\n  accept-new - Accept unknown hosts, reject changed keys"
    )]
    pub strict_host_key_checking: HostKeyPolicy,
}

/// Environment variable holding the password. It has no command-line flag.
pub const PASSWORD_ENV: &str = "LUNADM_PASSWORD";

/// Password from [`PASSWORD_ENV`], if set and not empty.
pub fn password_from_env() -> Option<SecretString> {
    password_from(std::env::var(PASSWORD_ENV).ok())
}

fn password_from(value: Option<String>) -> Option<SecretString> {
    value.filter(|v| !v.is_empty()).map(SecretString::from)
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LunCommand {
    /// Add LUNs on the storage controller
    Add {
        #[arg(required = true, value_name = "LUN_N")]
        luns: Vec<String>,

        #[arg(long = "type", value_name = "TYPE", help = "Type of LUN to add")]
        lun_type: Option<String>,

        #[arg(long, help = "Size of LUN")]
        size: Option<String>,

        #[arg(long, help = "igroup to associate with")]
        igroup: Option<String>,
    },

    /// Delete LUNs from the storage controller
    Del {
        #[arg(required = true, value_name = "LUN_N")]
        luns: Vec<String>,
    },

    /// Show LUNs on the storage controller
    Show {
        #[arg(long = "type", value_name = "TYPE", help = "Type of LUN to show")]
        lun_type: Option<String>,

        #[arg(long, value_name = "IGROUP", help = "Show igroup information")]
        igroups: Option<String>,

        #[arg(long, help = "Display mapped LUNs")]
        mapped: bool,

        #[arg(long, help = "Display unmapped LUNs")]
        unmapped: bool,

        #[arg(long, help = "Display online LUNs")]
        online: bool,

        #[arg(long, help = "Display offline LUNs")]
        offline: bool,

        #[arg(long, help = "Display staging LUNs")]
        staging: bool,
    },

    /// Reclaim unused space on thin provisioned LUNs
    SpaceReclaim {
        #[arg(required = true, value_name = "LUN_N")]
        luns: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lunadm", "show", "-t", "root@filer01", "--verbose", "--mapped",
        ])
        .unwrap();

        assert!(cli.global.verbose);
        assert_eq!(cli.global.target.as_deref(), Some("root@filer01"));
        assert_eq!(cli.global.protocol, "SSH");
        assert_eq!(cli.global.strict_host_key_checking, HostKeyPolicy::AcceptUnknown);
        assert!(matches!(cli.command, Some(LunCommand::Show { mapped: true, .. })));
    }

    #[test]
    fn test_add_options() {
        let cli = Cli::try_parse_from([
            "lunadm", "-t", "filer01", "add", "--size", "10g", "--igroup", "hosts", "lun1", "lun2",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(LunCommand::Add {
                luns: vec!["lun1".into(), "lun2".into()],
                lun_type: None,
                size: Some("10g".into()),
                igroup: Some("hosts".into()),
            })
        );
    }

    #[test]
    fn test_space_reclaim_name() {
        let cli = Cli::try_parse_from(["lunadm", "space-reclaim", "lun1", "-p", "telnet"]).unwrap();
        assert_eq!(cli.global.protocol, "telnet");
        assert!(matches!(cli.command, Some(LunCommand::SpaceReclaim { .. })));
    }

    #[test]
    fn test_lun_names_required() {
        assert!(Cli::try_parse_from(["lunadm", "del"]).is_err());
    }

    #[test]
    fn test_short_version_flag() {
        let err = Cli::try_parse_from(["lunadm", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_bad_host_key_policy() {
        assert!(
            Cli::try_parse_from(["lunadm", "show", "--strict-host-key-checking", "maybe"]).is_err()
        );
    }

    #[test]
    fn test_password_not_accepted_on_command_line() {
        let err = Cli::try_parse_from(["lunadm", "show", "-t", "filer01", "--password", "pw"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_password_from_env_value() {
        assert!(password_from(None).is_none());
        assert!(password_from(Some(String::new())).is_none());
        let password = password_from(Some("pw".into())).unwrap();
        assert_eq!(password.expose_secret(), "pw");
    }
}
