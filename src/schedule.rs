//! Daily trigger management through the user's crontab.
//!
//! Entries written by this tool carry a trailing marker comment so they can be
//! replaced or removed without touching anything else in the crontab.

use crate::error::{AppError, Result};
use std::io::Write;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, instrument};

const ENTRY_MARKER: &str = "# affiliate-sync";

/// What `crontab -l` prints on stderr when the user has no crontab yet.
const NO_CRONTAB: &str = "no crontab for";

pub trait TriggerScheduler {
    /// Run `sync` every day at `hour`:00 local time, replacing any earlier trigger.
    fn schedule_daily(&self, hour: u8) -> Result<()>;

    fn unschedule(&self) -> Result<()>;
}

pub struct CrontabScheduler {
    program: OsString,
    args: Vec<OsString>,
}

impl Default for CrontabScheduler {
    fn default() -> Self {
        Self {
            program: OsString::from("crontab"),
            args: Vec::new(),
        }
    }
}

impl CrontabScheduler {
    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn read(&self) -> Result<String> {
        let output = self.command().arg("-l").output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_lowercase().contains(NO_CRONTAB) {
                debug!(stderr = %stderr.trim(), "No existing crontab");
                return Ok(String::new());
            }
            // Installing over an unreadable crontab would drop the user's entries
            return Err(AppError::Config(format!(
                "Failed to read crontab: {}",
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| AppError::Config(format!("Crontab is not valid UTF-8: {}", e)))
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut child = self
            .command()
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(contents.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(AppError::Config(format!(
                "Failed to install crontab: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

impl TriggerScheduler for CrontabScheduler {
    #[instrument(name = "Scheduling daily sync", skip(self))]
    fn schedule_daily(&self, hour: u8) -> Result<()> {
        let exe = std::env::current_exe()?;
        let line = entry_line(hour, &exe)?;

        let updated = install_entry(&self.read()?, &line);
        self.write(&updated)?;

        info!(hour, entry = %line, "Daily sync scheduled");
        Ok(())
    }

    #[instrument(name = "Removing scheduled sync", skip_all)]
    fn unschedule(&self) -> Result<()> {
        let existing = self.read()?;
        let updated = remove_entry(&existing);
        if updated == existing {
            info!("No scheduled sync to remove");
            return Ok(());
        }

        self.write(&updated)?;
        info!("Scheduled sync removed");
        Ok(())
    }
}

fn entry_line(hour: u8, exe: &Path) -> Result<String> {
    if hour > 23 {
        return Err(AppError::Config(format!(
            "Hour must be between 0 and 23, got {}",
            hour
        )));
    }

    Ok(format!(
        "0 {} * * * '{}' sync {}",
        hour,
        exe.display().to_string().replace('\'', "'\\''"),
        ENTRY_MARKER
    ))
}

/// Crontab text with every tagged entry dropped.
fn remove_entry(crontab: &str) -> String {
    let mut kept: String = crontab
        .lines()
        .filter(|line| !line.trim_end().ends_with(ENTRY_MARKER))
        .map(|line| format!("{}\n", line))
        .collect();

    if kept.trim().is_empty() {
        kept.clear();
    }
    kept
}

/// Crontab text with exactly one tagged entry, `line`, appended.
fn install_entry(crontab: &str, line: &str) -> String {
    let mut updated = remove_entry(crontab);
    updated.push_str(line);
    updated.push('\n');
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const EXISTING: &str = "MAILTO=ops@example.com\n30 2 * * * /usr/bin/backup\n";

    fn line(hour: u8) -> String {
        entry_line(hour, &PathBuf::from("/usr/local/bin/affiliate-sync")).unwrap()
    }

    #[test]
    fn test_entry_line() {
        assert_eq!(
            line(6),
            "0 6 * * * '/usr/local/bin/affiliate-sync' sync # affiliate-sync"
        );
    }

    #[test]
    fn test_entry_line_rejects_invalid_hour() {
        let err = entry_line(24, &PathBuf::from("/bin/x")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_install_keeps_other_entries() {
        let updated = install_entry(EXISTING, &line(6));
        assert_eq!(updated, format!("{}{}\n", EXISTING, line(6)));
    }

    #[test]
    fn test_install_replaces_previous_trigger() {
        let once = install_entry(EXISTING, &line(6));
        let twice = install_entry(&once, &line(9));

        assert_eq!(twice, format!("{}{}\n", EXISTING, line(9)));
        assert_eq!(twice.matches(ENTRY_MARKER).count(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let installed = install_entry(EXISTING, &line(6));
        assert_eq!(remove_entry(&installed), EXISTING);
        assert_eq!(remove_entry(EXISTING), EXISTING);
        assert_eq!(remove_entry(&install_entry("", &line(6))), "");
    }

    /// Scheduler backed by a shell script standing in for `crontab`.
    /// `-l` runs `list`, and `-` saves stdin to `installed` in the same directory.
    fn fake_crontab(name: &str, list: &str) -> (CrontabScheduler, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "affiliate-sync-crontab-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let installed = dir.join("installed");
        let _ = fs::remove_file(&installed);

        let script = dir.join("crontab.sh");
        fs::write(
            &script,
            format!(
                "case \"$1\" in\n  -l) {}\n    ;;\n  -) cat > '{}' ;;\nesac\n",
                list,
                installed.display()
            ),
        )
        .unwrap();

        let scheduler = CrontabScheduler {
            program: OsString::from("sh"),
            args: vec![script.into_os_string()],
        };
        (scheduler, installed)
    }

    #[test]
    fn test_schedule_keeps_existing_entries() {
        let (scheduler, installed) = fake_crontab(
            "existing",
            "printf 'MAILTO=ops@example.com\\n30 2 * * * /usr/bin/backup\\n'",
        );

        scheduler.schedule_daily(6).unwrap();

        let expected = entry_line(6, &std::env::current_exe().unwrap()).unwrap();
        assert_eq!(
            fs::read_to_string(installed).unwrap(),
            format!("{}{}\n", EXISTING, expected)
        );
    }

    #[test]
    fn test_schedule_without_crontab_installs_entry() {
        let (scheduler, installed) = fake_crontab(
            "none",
            "echo 'no crontab for tester' >&2; exit 1",
        );

        scheduler.schedule_daily(7).unwrap();

        let contents = fs::read_to_string(installed).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.starts_with("0 7 * * * "));
    }

    #[test]
    fn test_unreadable_crontab_is_left_alone() {
        let (scheduler, installed) = fake_crontab(
            "unreadable",
            "echo 'crontab: cannot open spool: Permission denied' >&2; exit 1",
        );

        let err = scheduler.schedule_daily(6).unwrap_err();

        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("Permission denied")));
        assert!(!installed.exists(), "crontab must not be rewritten");
        assert!(scheduler.unschedule().is_err());
    }
}
