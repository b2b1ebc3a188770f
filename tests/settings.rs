use mixerctl::{mixer::Layout, settings::Settings};
use std::fs;

#[test]
fn init_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::init(dir.path()).unwrap();

    assert_eq!(s.r().app().layout, Layout::Horizontal);
    assert_eq!(s.r().app().refresh_ms, 500);
    let json = fs::read_to_string(dir.path().join("app.json")).unwrap();
    assert!(json.contains("\"layout\": \"horizontal\""));
}

#[test]
fn changes_survive_a_sync() {
    let dir = tempfile::tempdir().unwrap();
    {
        let s = Settings::init(dir.path()).unwrap();
        {
            let mut app = s.w().app();
            app.layout = Layout::Tabbed;
            app.device = Some("/dev/mixer1".into());
            app.controls
                .entry("outputs.master".into())
                .or_default()
                .insert("show-bind".into(), false);
        }
        s.sync().unwrap();
    }

    let s = Settings::init(dir.path()).unwrap();
    let app = s.r().app();
    assert_eq!(app.layout, Layout::Tabbed);
    assert_eq!(app.device, Some("/dev/mixer1".into()));
    assert_eq!(app.overrides().count(), 1);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("app.json"), "{ not json").unwrap();

    let s = Settings::init(dir.path()).unwrap();
    assert_eq!(s.r().app().view.as_deref(), Some("outputs"));
    let json = fs::read_to_string(dir.path().join("app.json")).unwrap();
    assert!(json.contains("\"refresh_ms\": 500"));
}

#[test]
fn missing_directory_fails_to_sync() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Settings::init(dir.path().join("nope").as_path()).is_err());
}
