use std::collections::{BTreeMap, HashMap};
use std::io;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::{Environment, SpecialFolder};

#[derive(Debug)]
struct EnvironmentState {
    machine_name: Option<String>,
    user_name: Option<String>,
    os_version: Option<String>,
    processor_count: NonZero<usize>,
    process_id: u32,
    tick_count: Duration,
    current_directory: PathBuf,
    command_line_args: Vec<String>,
    variables: BTreeMap<String, String>,
    special_folders: HashMap<SpecialFolder, PathBuf>,
    temp_directory: PathBuf,
}

/// An [`Environment`] whose host facts and variables are set by the test.
///
/// Variables and the current directory live in the fake, never in the real process, so tests
/// using separate fakes can run in parallel. [`exit()`][Environment::exit] and
/// [`fail_fast()`][Environment::fail_fast] panic instead of terminating the process, which a test
/// can observe with `#[should_panic]` or [`std::panic::catch_unwind`].
///
/// Clones share the same state.
///
/// # Example
///
/// ```
/// use platform_seams::Environment;
/// use platform_seams::fake::FakeEnvironment;
///
/// let environment = FakeEnvironment::new().with_variable("HOME", "/home/test");
///
/// assert_eq!(environment.expand_variables("%HOME%/.config"), "/home/test/.config");
/// ```
#[derive(Clone, Debug)]
pub struct FakeEnvironment {
    state: Arc<Mutex<EnvironmentState>>,
}

impl FakeEnvironment {
    /// Creates an environment of a single-processor machine named `fake-host`, with user `tester`,
    /// no variables and `/` as the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EnvironmentState {
                machine_name: Some("fake-host".to_owned()),
                user_name: Some("tester".to_owned()),
                os_version: Some("FakeOS 1.0".to_owned()),
                processor_count: NonZero::<usize>::MIN,
                process_id: 1,
                tick_count: Duration::ZERO,
                current_directory: PathBuf::from("/"),
                command_line_args: vec!["fake".to_owned()],
                variables: BTreeMap::new(),
                special_folders: HashMap::new(),
                temp_directory: PathBuf::from("/tmp"),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, EnvironmentState> {
        self.state
            .lock()
            .expect("fake environment lock poisoned - cannot continue execution")
    }

    /// Sets the machine name. `None` simulates a platform that reports none.
    #[must_use]
    pub fn with_machine_name(self, name: Option<&str>) -> Self {
        self.state().machine_name = name.map(str::to_owned);
        self
    }

    /// Sets the user name. `None` simulates an environment that reports none.
    #[must_use]
    pub fn with_user_name(self, name: Option<&str>) -> Self {
        self.state().user_name = name.map(str::to_owned);
        self
    }

    /// Sets the operating system version description.
    #[must_use]
    pub fn with_os_version(self, version: &str) -> Self {
        self.state().os_version = Some(version.to_owned());
        self
    }

    /// Sets the number of processors available to the process.
    #[must_use]
    pub fn with_processor_count(self, count: NonZero<usize>) -> Self {
        self.state().processor_count = count;
        self
    }

    /// Sets the process identifier.
    #[must_use]
    pub fn with_process_id(self, id: u32) -> Self {
        self.state().process_id = id;
        self
    }

    /// Sets the current directory.
    #[must_use]
    pub fn with_current_directory(self, path: impl Into<PathBuf>) -> Self {
        self.state().current_directory = path.into();
        self
    }

    /// Sets the command line arguments, starting with the program name.
    #[must_use]
    pub fn with_command_line_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().command_line_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn with_variable(self, name: &str, value: &str) -> Self {
        self.state()
            .variables
            .insert(name.to_owned(), value.to_owned());
        self
    }

    /// Defines the path of a well-known folder. Folders not defined report `None`.
    #[must_use]
    pub fn with_special_folder(self, folder: SpecialFolder, path: impl Into<PathBuf>) -> Self {
        self.state().special_folders.insert(folder, path.into());
        self
    }

    /// Sets the directory for temporary files.
    #[must_use]
    pub fn with_temp_directory(self, path: impl Into<PathBuf>) -> Self {
        self.state().temp_directory = path.into();
        self
    }

    /// Moves the time since machine start forward.
    pub fn advance_tick_count(&self, by: Duration) {
        let mut state = self.state();
        state.tick_count = state.tick_count.saturating_add(by);
    }
}

impl Default for FakeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for FakeEnvironment {
    fn machine_name(&self) -> Option<String> {
        self.state().machine_name.clone()
    }

    fn user_name(&self) -> Option<String> {
        self.state().user_name.clone()
    }

    fn os_version(&self) -> Option<String> {
        self.state().os_version.clone()
    }

    fn processor_count(&self) -> io::Result<NonZero<usize>> {
        Ok(self.state().processor_count)
    }

    fn process_id(&self) -> u32 {
        self.state().process_id
    }

    fn is_64bit_process(&self) -> bool {
        cfg!(target_pointer_width = "64")
    }

    fn new_line(&self) -> &'static str {
        "\n"
    }

    fn tick_count(&self) -> Duration {
        self.state().tick_count
    }

    fn current_directory(&self) -> io::Result<PathBuf> {
        Ok(self.state().current_directory.clone())
    }

    fn set_current_directory(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        state.current_directory = state.current_directory.join(path);
        Ok(())
    }

    fn command_line(&self) -> String {
        self.state().command_line_args.join(" ")
    }

    fn command_line_args(&self) -> Vec<String> {
        self.state().command_line_args.clone()
    }

    fn variable(&self, name: &str) -> Option<String> {
        self.state().variables.get(name).cloned()
    }

    fn variables(&self) -> BTreeMap<String, String> {
        self.state().variables.clone()
    }

    unsafe fn set_variable(&self, name: &str, value: &str) {
        self.state()
            .variables
            .insert(name.to_owned(), value.to_owned());
    }

    unsafe fn remove_variable(&self, name: &str) {
        self.state().variables.remove(name);
    }

    fn special_folder(&self, folder: SpecialFolder) -> Option<PathBuf> {
        self.state().special_folders.get(&folder).cloned()
    }

    fn temp_directory(&self) -> PathBuf {
        self.state().temp_directory.clone()
    }

    #[cfg_attr(test, mutants::skip)] // Only observable as a panic.
    fn exit(&self, code: i32) -> ! {
        panic!("process exit requested with code {code}");
    }

    #[cfg_attr(test, mutants::skip)] // Only observable as a panic.
    fn fail_fast(&self, message: &str) -> ! {
        panic!("fail fast requested: {message}");
    }
}
