use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::System;
use tracing::error;

/// Well-known per-user folders.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SpecialFolder {
    /// The home directory of the current user.
    Home,

    /// The desktop folder.
    Desktop,

    /// The documents folder.
    Documents,

    /// The downloads folder.
    Downloads,

    /// The music folder.
    Music,

    /// The pictures folder.
    Pictures,

    /// The videos folder.
    Videos,

    /// Per-user application configuration, roaming where the platform distinguishes.
    Config,

    /// Per-user application data, roaming where the platform distinguishes.
    Data,

    /// Per-user application data that stays on this machine.
    LocalData,

    /// Per-user cache data.
    Cache,
}

/// The environment of the current process and the machine it runs on.
pub trait Environment: Debug + Send + Sync {
    /// The network name of the machine, if the platform reports one.
    fn machine_name(&self) -> Option<String>;

    /// The name of the user the process runs as, if the environment reports one.
    fn user_name(&self) -> Option<String>;

    /// A human-readable description of the operating system version.
    fn os_version(&self) -> Option<String>;

    /// The number of processors this process may use.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error if the count cannot be determined.
    fn processor_count(&self) -> io::Result<NonZero<usize>>;

    /// The operating system identifier of the current process.
    fn process_id(&self) -> u32;

    /// Whether the current process uses 64-bit pointers.
    fn is_64bit_process(&self) -> bool;

    /// The line terminator of the platform.
    fn new_line(&self) -> &'static str;

    /// Time elapsed since the machine started.
    fn tick_count(&self) -> Duration;

    /// The working directory of the process.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error, e.g. if the directory was deleted.
    fn current_directory(&self) -> io::Result<PathBuf>;

    /// Changes the working directory of the process.
    ///
    /// # Errors
    ///
    /// Fails with the operating system error, e.g. if the directory does not exist.
    fn set_current_directory(&self, path: &Path) -> io::Result<()>;

    /// The command line of the process, arguments separated by spaces.
    fn command_line(&self) -> String;

    /// The command line arguments of the process, starting with the program name.
    fn command_line_args(&self) -> Vec<String>;

    /// The value of an environment variable, or `None` if it is not set or not valid Unicode.
    fn variable(&self, name: &str) -> Option<String>;

    /// All environment variables of the process.
    fn variables(&self) -> BTreeMap<String, String>;

    /// Sets an environment variable of the process.
    ///
    /// # Safety
    ///
    /// Same contract as [`std::env::set_var`]: no other thread may read or write the process
    /// environment concurrently.
    unsafe fn set_variable(&self, name: &str, value: &str);

    /// Removes an environment variable from the process.
    ///
    /// # Safety
    ///
    /// Same contract as [`std::env::remove_var`]: no other thread may read or write the process
    /// environment concurrently.
    unsafe fn remove_variable(&self, name: &str);

    /// Replaces each `%NAME%` in `text` with the value of the environment variable `NAME`.
    ///
    /// References to variables that are not set are left as they are.
    fn expand_variables(&self, text: &str) -> String {
        let mut expanded = String::with_capacity(text.len());
        let mut rest = text;

        while let Some((before, after)) = rest.split_once('%') {
            expanded.push_str(before);

            let Some((name, remainder)) = after.split_once('%') else {
                expanded.push('%');
                rest = after;
                break;
            };

            let value = if name.is_empty() {
                None
            } else {
                self.variable(name)
            };

            if let Some(value) = value {
                expanded.push_str(&value);
                rest = remainder;
            } else {
                // The closing '%' may open the next reference.
                expanded.push('%');
                expanded.push_str(name);
                rest = after.split_at(name.len()).1;
            }
        }

        expanded.push_str(rest);
        expanded
    }

    /// The path of a well-known per-user folder, if the platform defines it.
    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf>;

    /// The directory for temporary files.
    fn temp_directory(&self) -> PathBuf;

    /// Terminates the process with the given exit code, without unwinding.
    fn exit(&self, code: i32) -> !;

    /// Logs `message` and terminates the process immediately, without unwinding or running
    /// any cleanup.
    fn fail_fast(&self, message: &str) -> !;
}

/// The environment of the real process, read from and written to the operating system.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    /// Creates a handle to the environment of the current process.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnvironment {
    fn machine_name(&self) -> Option<String> {
        System::host_name()
    }

    fn user_name(&self) -> Option<String> {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
    }

    fn os_version(&self) -> Option<String> {
        System::long_os_version()
    }

    fn processor_count(&self) -> io::Result<NonZero<usize>> {
        std::thread::available_parallelism()
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn is_64bit_process(&self) -> bool {
        cfg!(target_pointer_width = "64")
    }

    fn new_line(&self) -> &'static str {
        if cfg!(windows) { "\r\n" } else { "\n" }
    }

    fn tick_count(&self) -> Duration {
        Duration::from_secs(System::uptime())
    }

    fn current_directory(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn set_current_directory(&self, path: &Path) -> io::Result<()> {
        std::env::set_current_dir(path)
    }

    fn command_line(&self) -> String {
        self.command_line_args().join(" ")
    }

    fn command_line_args(&self) -> Vec<String> {
        std::env::args_os()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn variable(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn variables(&self) -> BTreeMap<String, String> {
        std::env::vars_os()
            .map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    unsafe fn set_variable(&self, name: &str, value: &str) {
        // SAFETY: Forwarding the caller's guarantee that nothing else touches the environment.
        unsafe {
            std::env::set_var(name, value);
        }
    }

    unsafe fn remove_variable(&self, name: &str) {
        // SAFETY: Forwarding the caller's guarantee that nothing else touches the environment.
        unsafe {
            std::env::remove_var(name);
        }
    }

    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf> {
        match folder {
            SpecialFolder::Home => dirs::home_dir(),
            SpecialFolder::Desktop => dirs::desktop_dir(),
            SpecialFolder::Documents => dirs::document_dir(),
            SpecialFolder::Downloads => dirs::download_dir(),
            SpecialFolder::Music => dirs::audio_dir(),
            SpecialFolder::Pictures => dirs::picture_dir(),
            SpecialFolder::Videos => dirs::video_dir(),
            SpecialFolder::Config => dirs::config_dir(),
            SpecialFolder::Data => dirs::data_dir(),
            SpecialFolder::LocalData => dirs::data_local_dir(),
            SpecialFolder::Cache => dirs::cache_dir(),
        }
    }

    fn temp_directory(&self) -> PathBuf {
        std::env::temp_dir()
    }

    #[cfg_attr(test, mutants::skip)] // Terminates the test process.
    #[expect(clippy::exit, reason = "exiting the process is the purpose of this operation")]
    fn exit(&self, code: i32) -> ! {
        std::process::exit(code)
    }

    #[cfg_attr(test, mutants::skip)] // Terminates the test process.
    fn fail_fast(&self, message: &str) -> ! {
        error!(message, "failing fast");
        std::process::abort()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(SystemEnvironment: Send, Sync, Copy);

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
    fn host_facts_match_platform() {
        let environment = SystemEnvironment::new();

        assert_eq!(environment.process_id(), std::process::id());
        assert_eq!(
            environment.is_64bit_process(),
            cfg!(target_pointer_width = "64")
        );
        assert!(environment.processor_count().is_ok());
        assert!(!environment.command_line_args().is_empty());
        assert!(
            environment
                .command_line()
                .starts_with(&environment.command_line_args().join(" "))
        );
    }

    #[test]
    fn new_line_matches_platform() {
        let expected = if cfg!(windows) { "\r\n" } else { "\n" };

        assert_eq!(SystemEnvironment::new().new_line(), expected);
    }

    #[test]
    fn expansion_edge_cases() {
        let environment = SystemEnvironment::new();

        assert_eq!(environment.expand_variables(""), "");
        assert_eq!(environment.expand_variables("no references"), "no references");
        assert_eq!(environment.expand_variables("100%"), "100%");
        assert_eq!(environment.expand_variables("100%%"), "100%%");
        assert_eq!(environment.expand_variables("%"), "%");
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
    fn temp_directory_exists() {
        assert!(SystemEnvironment::new().temp_directory().is_dir());
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
    fn home_matches_dirs() {
        assert_eq!(
            SystemEnvironment::new().special_folder(SpecialFolder::Home),
            dirs::home_dir()
        );
    }
}
