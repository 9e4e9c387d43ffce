use mounting_yard::{
    ConfigManager, Credentials, EndpointSet, EndpointStore, MountState, YardConfig,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_edit_cycle_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("Mounting Yard");

    let mut store = EndpointStore::new(&dir);
    let mut set = store.load().unwrap();
    assert!(set.is_empty());

    set.insert("Office", "smb://office/share", Credentials::user("kim"))
        .unwrap();
    set.insert("Mirror", "ftp://mirror/pub", Credentials::guest())
        .unwrap();
    assert_eq!(store.save(&mut set).unwrap(), 2);

    let raw = fs::read_to_string(dir.join("Mirror.mountingYard")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["address"], "ftp://mirror/pub");
    assert_eq!(json["guest"], "yes");
    assert!(json.get("mountedPoint").is_none());

    // A second session renames one endpoint
    let mut store = EndpointStore::new(&dir);
    let mut set = store.load().unwrap();
    let office = set.require("Office").unwrap();
    set.rename(office, "HQ").unwrap();
    assert_eq!(store.save(&mut set).unwrap(), 1);

    let mut names: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["HQ.mountingYard", "Mirror.mountingYard"]);
}

#[test]
fn test_stale_mount_point_loads_but_is_advisory() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("endpoints");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("nas.mountingYard"),
        r#"{"address": "smb://nas/share", "username": "", "mountedPoint": "/definitely/not/here"}"#,
    )
    .unwrap();

    let set = EndpointStore::new(&dir).load().unwrap();
    let nas = set.get(set.require("nas").unwrap()).unwrap();
    assert_eq!(
        nas.state(),
        &MountState::Mounted("/definitely/not/here".into())
    );
}

#[test]
fn test_export_and_import_between_machines() {
    let temp_dir = TempDir::new().unwrap();
    let export = temp_dir.path().join("shares.mountingYardExportFile");

    let mut laptop = EndpointSet::new();
    laptop
        .insert("Office", "smb://office/share", Credentials::user("kim"))
        .unwrap();
    laptop
        .insert("Printer", "afp://printer/spool", Credentials::default())
        .unwrap();
    EndpointStore::export(&laptop, &export).unwrap();

    let mut desktop = EndpointSet::new();
    desktop
        .insert("Printer", "afp://printer2/spool", Credentials::default())
        .unwrap();
    assert_eq!(EndpointStore::import(&mut desktop, &export).unwrap(), 1);

    // Importing twice adds nothing
    assert_eq!(EndpointStore::import(&mut desktop, &export).unwrap(), 0);
    assert_eq!(desktop.len(), 2);

    let dir = temp_dir.path().join("desktop");
    let mut store = EndpointStore::new(&dir);
    assert_eq!(store.save(&mut desktop).unwrap(), 2);
}

#[test]
fn test_config_drives_store_location() {
    let temp_dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_path(temp_dir.path().join("config.json"));
    let config = YardConfig {
        endpoints_dir: temp_dir.path().join("yard"),
        ..YardConfig::default()
    };
    manager.save(&config).unwrap();

    let loaded = manager.load().unwrap();
    assert_eq!(loaded.endpoints_dir().unwrap(), temp_dir.path().join("yard"));
    assert_eq!(
        loaded.mount_dir().unwrap(),
        temp_dir.path().join("yard").join("mounts")
    );

    let mut store = EndpointStore::new(loaded.endpoints_dir().unwrap());
    let mut set = store.load().unwrap();
    set.insert("x", "smb://x/y", Credentials::default()).unwrap();
    store.save(&mut set).unwrap();
    assert!(temp_dir.path().join("yard/x.mountingYard").exists());
}
