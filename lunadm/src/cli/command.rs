//! Builds the controller's `lun` command lines.

use super::args::LunCommand;
use crate::error::InputError;

impl LunCommand {
    /// Subcommand name as the controller spells it.
    pub fn name(&self) -> &'static str {
        match self {
            LunCommand::Add { .. } => "add",
            LunCommand::Del { .. } => "del",
            LunCommand::Show { .. } => "show",
            LunCommand::SpaceReclaim { .. } => "space-reclaim",
        }
    }

    /// Render the `lun ...` command line sent to the controller.
    pub fn to_command_line(&self) -> Result<String, InputError> {
        let mut words = vec!["lun".to_string(), self.name().to_string()];

        match self {
            LunCommand::Show {
                lun_type,
                igroups,
                mapped,
                unmapped,
                online,
                offline,
                staging,
            } => {
                words.push(lun_type.clone().unwrap_or_else(|| "all".to_string()));
                push_option(&mut words, "--igroups", igroups);
                let filters = [
                    ("--mapped", *mapped),
                    ("--unmapped", *unmapped),
                    ("--online", *online),
                    ("--offline", *offline),
                    ("--staging", *staging),
                ];
                words.extend(
                    filters
                        .into_iter()
                        .filter(|(_, enabled)| *enabled)
                        .map(|(flag, _)| flag.to_string()),
                );
            }
            LunCommand::Add {
                luns,
                lun_type,
                size,
                igroup,
            } => {
                push_option(&mut words, "--type", lun_type);
                push_option(&mut words, "--size", size);
                push_option(&mut words, "--igroup", igroup);
                self.push_luns(&mut words, luns)?;
            }
            LunCommand::Del { luns } | LunCommand::SpaceReclaim { luns } => {
                self.push_luns(&mut words, luns)?;
            }
        }

        Ok(words.join(" "))
    }

    /// Human-readable size of an `add` given as a plain kB count.
    ///
    /// Sizes with a unit suffix (`10g`) are passed through to the
    /// controller untouched and have no summary.
    pub fn size_summary(&self) -> Option<String> {
        match self {
            LunCommand::Add {
                size: Some(size), ..
            } => size.trim().parse().ok().map(format_size),
            _ => None,
        }
    }

    fn push_luns(&self, words: &mut Vec<String>, luns: &[String]) -> Result<(), InputError> {
        if luns.is_empty() {
            return Err(InputError::MissingLunNames {
                subcommand: self.name(),
            });
        }
        words.extend(luns.iter().cloned());
        Ok(())
    }
}

fn push_option(words: &mut Vec<String>, flag: &str, value: &Option<String>) {
    if let Some(value) = value {
        words.push(flag.to_string());
        words.push(value.clone());
    }
}

/// Format a kB count in the largest unit it exceeds.
///
/// Each step divides by 1024 and truncates, so exactly 1024 kB stays in
/// kB.
pub fn format_size(kb: u64) -> String {
    let mut size = kb;
    if size > 1024 {
        size /= 1024;
        if size > 1024 {
            size /= 1024;
            return format!("{size} gB");
        }
        return format!("{size} mB");
    }
    format!("{size} kB")
}

/// Pick the command to run: a raw `--command` wins over the subcommand.
pub fn resolve_command(
    raw: Option<&str>,
    subcommand: Option<&LunCommand>,
) -> Result<String, InputError> {
    match (raw.map(str::trim), subcommand) {
        (Some(raw), _) if !raw.is_empty() => Ok(raw.to_string()),
        (_, Some(subcommand)) => subcommand.to_command_line(),
        _ => Err(InputError::MissingCommand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show() -> LunCommand {
        LunCommand::Show {
            lun_type: None,
            igroups: None,
            mapped: false,
            unmapped: false,
            online: false,
            offline: false,
            staging: false,
        }
    }

    #[test]
    fn test_show_defaults_to_all() {
        assert_eq!(show().to_command_line().unwrap(), "lun show all");
    }

    #[test]
    fn test_show_filters_in_order() {
        let cmd = LunCommand::Show {
            lun_type: Some("vmware".into()),
            igroups: Some("esx".into()),
            mapped: true,
            unmapped: false,
            online: true,
            offline: false,
            staging: true,
        };
        assert_eq!(
            cmd.to_command_line().unwrap(),
            "lun show vmware --igroups esx --mapped --online --staging"
        );
    }

    #[test]
    fn test_add_options_precede_luns() {
        let cmd = LunCommand::Add {
            luns: vec!["/vol/vol0/lun1".into(), "/vol/vol0/lun2".into()],
            lun_type: Some("linux".into()),
            size: Some("10g".into()),
            igroup: None,
        };
        assert_eq!(
            cmd.to_command_line().unwrap(),
            "lun add --type linux --size 10g /vol/vol0/lun1 /vol/vol0/lun2"
        );
    }

    #[test]
    fn test_del_and_space_reclaim() {
        let del = LunCommand::Del {
            luns: vec!["lun1".into()],
        };
        assert_eq!(del.to_command_line().unwrap(), "lun del lun1");

        let reclaim = LunCommand::SpaceReclaim {
            luns: vec!["lun1".into(), "lun2".into()],
        };
        assert_eq!(reclaim.to_command_line().unwrap(), "lun space-reclaim lun1 lun2");
    }

    #[test]
    fn test_missing_luns() {
        let err = LunCommand::Del { luns: vec![] }.to_command_line().unwrap_err();
        assert!(matches!(err, InputError::MissingLunNames { subcommand: "del" }));
    }

    #[test]
    fn test_raw_command_wins() {
        let sub = show();
        assert_eq!(resolve_command(Some("lun stats"), Some(&sub)).unwrap(), "lun stats");
        assert_eq!(resolve_command(Some("  "), Some(&sub)).unwrap(), "lun show all");
        assert_eq!(resolve_command(Some("version"), None).unwrap(), "version");
        assert!(matches!(
            resolve_command(None, None),
            Err(InputError::MissingCommand)
        ));
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(0), "0 kB");
        assert_eq!(format_size(1024), "1024 kB");
        assert_eq!(format_size(1025), "1 mB");
        assert_eq!(format_size(1024 * 1024), "1024 mB");
        assert_eq!(format_size(1024 * 1024 + 1024), "1 gB");
        assert_eq!(format_size(10 * 1024 * 1024), "10 gB");
    }

    #[test]
    fn test_size_summary_only_for_plain_counts() {
        let add = |size: &str| LunCommand::Add {
            luns: vec!["lun1".into()],
            lun_type: None,
            size: Some(size.into()),
            igroup: None,
        };
        assert_eq!(add("2048").size_summary().as_deref(), Some("2 mB"));
        assert_eq!(add("10g").size_summary(), None);
        assert_eq!(show().size_summary(), None);
    }
}
