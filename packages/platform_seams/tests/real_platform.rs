//! Tests of the real implementations against the operating system.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use platform_seams::{
    ChangeKind, Environment, ExecutableImage, FileSystemWatcher, SystemEnvironment,
    SystemFileSystemWatcher, SystemImage, WaitOutcome, WatcherChangeTypes,
};
use testing::with_watchdog;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn watcher_reports_matching_creation() {
    with_watchdog(|| {
        let temp = tempfile::tempdir().expect("temporary directory can be created");
        let root = temp.path();

        let watcher = SystemFileSystemWatcher::new(root, "*.txt").expect("valid filter");
        let (tx, rx) = mpsc::channel();
        watcher.on_created(Box::new(move |event| {
            drop(tx.send(event.name().to_owned()));
        }));
        watcher
            .set_enable_raising_events(true)
            .expect("temporary directory can be watched");

        fs::write(root.join("image.png"), b"png").expect("file can be written");
        fs::write(root.join("notes.txt"), b"notes").expect("file can be written");

        let name = rx
            .recv_timeout(DELIVERY_TIMEOUT)
            .expect("creation is reported");
        assert_eq!(name, "notes.txt");
    });
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn watcher_reports_names_under_relative_path() {
    with_watchdog(|| {
        let temp = tempfile::tempdir_in(".").expect("temporary directory can be created");
        let root = temp.path();
        assert!(root.is_relative());

        let watcher = SystemFileSystemWatcher::new(root, "*.txt").expect("valid filter");
        let (tx, rx) = mpsc::channel();
        watcher.on_created(Box::new(move |event| {
            drop(tx.send(event.name().to_owned()));
        }));
        watcher
            .set_enable_raising_events(true)
            .expect("temporary directory can be watched");

        fs::write(root.join("notes.txt"), b"notes").expect("file can be written");

        let name = rx
            .recv_timeout(DELIVERY_TIMEOUT)
            .expect("creation is reported");
        assert_eq!(name, "notes.txt");
    });
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn watcher_wait_enables_temporarily() {
    with_watchdog(|| {
        let temp = tempfile::tempdir().expect("temporary directory can be created");
        // Full paths are reported in canonical form on some platforms, e.g. /private/var on macOS.
        let root = temp.path().canonicalize().expect("directory exists");

        let watcher = SystemFileSystemWatcher::new(&root, "*").expect("valid filter");

        // The watch is armed inside the wait, so keep creating files until it is observed.
        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let done = Arc::clone(&done);
            let root = root.clone();

            thread::spawn(move || {
                let mut index = 0_u32;

                while !done.load(Ordering::Relaxed) {
                    fs::write(root.join(format!("file{index}")), b"x")
                        .expect("file can be written");
                    index = index.wrapping_add(1);
                    thread::sleep(Duration::from_millis(20));
                }
            })
        };

        let outcome = watcher
            .wait_for_changed(WatcherChangeTypes::CREATED, Some(DELIVERY_TIMEOUT))
            .expect("temporary directory can be watched");

        done.store(true, Ordering::Relaxed);
        writer.join().expect("writer thread does not panic");

        let WaitOutcome::Changed(event) = outcome else {
            panic!("no creation observed within {DELIVERY_TIMEOUT:?}");
        };
        assert_eq!(event.kind(), ChangeKind::Created);
        assert!(event.full_path().starts_with(&root));
        assert!(!watcher.enable_raising_events());
    });
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn watcher_reports_missing_directory() {
    let temp = tempfile::tempdir().expect("temporary directory can be created");
    let watcher =
        SystemFileSystemWatcher::new(temp.path().join("missing"), "*").expect("valid filter");

    watcher
        .set_enable_raising_events(true)
        .expect_err("missing directory cannot be watched");
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn image_of_test_executable() {
    let image = SystemImage::current().expect("test executable is a valid image");

    assert_eq!(
        image.location(),
        std::env::current_exe().expect("path of test executable is known")
    );
    assert!(!image.resources().expect("image parses").is_empty());
}

#[test]
#[cfg_attr(miri, ignore)] // Miri cannot talk to the real platform.
fn environment_current_directory_exists() {
    let environment = SystemEnvironment::new();

    assert!(
        environment
            .current_directory()
            .expect("current directory is readable")
            .is_dir()
    );
    assert!(environment.tick_count() > Duration::ZERO);
}
