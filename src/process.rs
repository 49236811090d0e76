//! Process name lookup by pid.

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Resolves the executable name for a process id, with any trailing
/// `.exe` removed. Returns an empty string when the process has exited.
pub fn process_name_for_pid(pid: u32) -> String {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    let name = sys
        .process(Pid::from_u32(pid))
        .map(|p| p.name().to_string_lossy().to_string())
        .unwrap_or_default();
    name.strip_suffix(".exe").map(str::to_string).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_process_resolves_to_nonempty_name() {
        let name = process_name_for_pid(std::process::id());
        assert!(!name.is_empty());
        assert!(!name.ends_with(".exe"));
    }

    #[test]
    fn dead_pid_resolves_to_empty() {
        assert_eq!(process_name_for_pid(u32::MAX - 7), "");
    }
}
