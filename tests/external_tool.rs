#![cfg(unix)]

use imgref::ImgVec;
use parrot_maker::progress::NoProgress;
use parrot_maker::{bitmap, make, Config, Error};
use rgb::RGBA8;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Writing a script while another test spawns a process can make exec fail with ETXTBSY
static SERIAL: Mutex<()> = Mutex::new(());

/// A stand-in for ffmpeg: logs its arguments, creates its last argument, and fails when asked to
fn fake_tool(dir: &Path, log: &Path, fail_on: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    let script = format!(
        "#!/bin/sh\n\
         printf '%s\\n' \"$*\" >> '{log}'\n\
         case \"$*\" in *'{fail_on}'*) echo 'fake failure' >&2; exit 1;; esac\n\
         for last; do :; done\n\
         touch \"$last\"\n",
        log = log.display(),
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn party(root: &Path) -> Config {
    let mut config = Config::rooted(root);
    config.positions = vec![(0, 0), (5, 5), (10, 10)];
    fs::create_dir_all(&config.frames_dir).unwrap();
    let input = ImgVec::new(vec![RGBA8::new(255, 255, 0, 255); 40 * 20], 40, 20);
    bitmap::write_png(&config.input, input.as_ref()).unwrap();
    for i in 0..3 {
        let bg = ImgVec::new(vec![RGBA8::new(0, 0, 50 * i as u8, 255); 60 * 40], 60, 40);
        bitmap::write_png(&config.frames_dir.join(format!("{i}.png")), bg.as_ref()).unwrap();
    }
    config
}

#[test]
fn external_tool_runs_in_order() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let mut config = party(dir.path());
    config.tool = fake_tool(dir.path(), &log, "never-matches");

    // leftovers from an earlier run must be deleted before the tool runs
    fs::create_dir_all(config.output.parent().unwrap()).unwrap();
    fs::create_dir_all(&config.intermediates_dir).unwrap();
    fs::write(&config.output, b"stale gif").unwrap();
    fs::write(config.palette_path(), b"stale palette").unwrap();

    let report = make(&config, &mut NoProgress {}).unwrap();
    assert_eq!("ffmpeg", report.strategy);
    assert_eq!(3, report.intermediates.len());
    assert_eq!(None, report.frames_written);

    let calls = fs::read_to_string(&log).unwrap();
    let calls: Vec<_> = calls.lines().collect();
    assert_eq!(2, calls.len(), "{calls:?}");
    assert!(calls[0].contains("palettegen=reserve_transparent=1"));
    assert!(calls[0].contains("%d.png"));
    assert!(calls[1].starts_with("-framerate 20 "));
    assert!(calls[1].contains("paletteuse=alpha_threshold=128"));
    assert!(calls[1].contains("-gifflags -offsetting"));

    // the fake tool only touches files, so the old contents are gone
    assert_eq!(0, fs::metadata(&config.output).unwrap().len());
    assert_eq!(0, fs::metadata(config.palette_path()).unwrap().len());
}

#[test]
fn failing_palette_step_stops_everything() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let mut config = party(dir.path());
    config.tool = fake_tool(dir.path(), &log, "palettegen");

    let res = make(&config, &mut NoProgress {});
    match res {
        Err(Error::ExternalTool(msg)) => assert!(msg.contains("fake failure"), "{msg}"),
        other => panic!("{other:?}"),
    }
    // no fallback to the built-in encoder, and the second command never ran
    assert!(!config.output.exists());
    assert_eq!(1, fs::read_to_string(&log).unwrap().lines().count());
}
