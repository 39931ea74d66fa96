use super::read_all;
use crate::error::Error;
use crate::filer::{DeleteMode, Filer, WriteMode, reader_from_bytes};
use crate::testing::MemoryRemote;
use crate::volumes::VolumesFiler;
use std::sync::Arc;

const VOLUME: &str = "/Volumes/main/default/landing";

fn setup() -> (MemoryRemote, VolumesFiler) {
    let remote = MemoryRemote::new();
    remote.put_dir(VOLUME);
    let filer = VolumesFiler::new(Arc::new(remote.clone()), "/");
    (remote, filer)
}

#[tokio::test]
async fn test_listing_follows_pages() {
    let (remote, filer) = setup();
    remote.set_page_size(2);
    for i in 0..5 {
        remote.put_file(&format!("{VOLUME}/f{i}.csv"), format!("{i}"));
    }

    let entries = filer.read_dir(VOLUME).await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["f0.csv", "f1.csv", "f2.csv", "f3.csv", "f4.csv"]);

    let pages = remote
        .calls()
        .iter()
        .filter(|c| c.starts_with("files.list"))
        .count();
    assert_eq!(pages, 3);
}

#[tokio::test]
async fn test_recursive_delete_removes_files_first() {
    let (remote, filer) = setup();
    remote.put_file(&format!("{VOLUME}/t/a.txt"), "a");
    remote.put_file(&format!("{VOLUME}/t/sub/b.txt"), "b");
    remote.put_dir(&format!("{VOLUME}/t/empty"));

    filer
        .delete(&format!("{VOLUME}/t"), DeleteMode::RECURSIVE)
        .await
        .unwrap();
    assert!(!remote.exists(&format!("{VOLUME}/t")));
    assert!(remote.is_dir(VOLUME));

    let calls = remote.calls();
    let last_file_delete = calls
        .iter()
        .rposition(|c| c.starts_with("files.delete "))
        .unwrap();
    let first_dir_delete = calls
        .iter()
        .position(|c| c.starts_with("files.delete-directory"))
        .unwrap();
    assert!(last_file_delete < first_dir_delete);
}

#[tokio::test]
async fn test_upload_conflict() {
    let (remote, filer) = setup();
    let path = format!("{VOLUME}/x.parquet");
    remote.put_file(&path, "old");

    let err = filer
        .write(&path, reader_from_bytes("new"), WriteMode::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileAlreadyExists(_)), "{err:?}");

    filer
        .write(&path, reader_from_bytes("new"), WriteMode::OVERWRITE_IF_EXISTS)
        .await
        .unwrap();
    assert_eq!(read_all(&filer, &path).await, b"new");
}

#[tokio::test]
async fn test_mkdir_over_file() {
    let (remote, filer) = setup();
    remote.put_file(&format!("{VOLUME}/file"), "x");

    let err = filer.mkdir(&format!("{VOLUME}/file")).await.unwrap_err();
    assert!(
        matches!(err, Error::CannotCreateDirectoryBecauseFileExists(_)),
        "{err:?}"
    );
}
