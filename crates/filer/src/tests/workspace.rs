use super::read_all;
use crate::error::Error;
use crate::filer::{Filer, WriteMode, reader_from_bytes};
use crate::testing::MemoryRemote;
use crate::workspace::WorkspaceFiler;
use std::sync::Arc;

fn setup() -> (MemoryRemote, WorkspaceFiler) {
    let remote = MemoryRemote::new();
    let filer = WorkspaceFiler::new(Arc::new(remote.clone()), "/");
    (remote, filer)
}

#[tokio::test]
async fn test_metadata_is_surfaced() {
    let (remote, filer) = setup();
    remote.put_notebook("/Users/me/analysis", "PYTHON", "print(1)\n");
    remote.put_file("/Users/me/notes.txt", "hi");

    let entries = filer.read_dir("/Users/me").await.unwrap();
    assert_eq!(entries.len(), 2);

    let notebook = &entries[0];
    assert_eq!(notebook.name, "analysis");
    let meta = notebook.metadata.as_ref().unwrap();
    assert_eq!(meta.object_type, "NOTEBOOK");
    assert_eq!(meta.language.as_deref(), Some("PYTHON"));

    let file = &entries[1];
    assert_eq!(file.metadata.as_ref().unwrap().object_type, "FILE");
    assert!(file.metadata.as_ref().unwrap().language.is_none());
}

#[tokio::test]
async fn test_notebook_exports_source() {
    let (remote, filer) = setup();
    remote.put_notebook("/Users/me/nb", "SQL", "select 1");
    assert_eq!(read_all(&filer, "/Users/me/nb").await, b"select 1");
}

#[tokio::test]
async fn test_create_parents_retries_after_mkdirs() {
    let (remote, filer) = setup();
    filer
        .write(
            "/Shared/deep/er/file.py",
            reader_from_bytes("x = 1"),
            WriteMode::CREATE_PARENT_DIRECTORIES,
        )
        .await
        .unwrap();

    let imports = remote
        .calls()
        .iter()
        .filter(|c| c.starts_with("workspace.import"))
        .count();
    assert_eq!(imports, 2);
    assert!(remote.is_dir("/Shared/deep/er"));
    assert_eq!(remote.file("/Shared/deep/er/file.py").unwrap(), b"x = 1");
}

#[tokio::test]
async fn test_mkdir_over_file() {
    let (remote, filer) = setup();
    remote.put_file("/Shared/file", "x");

    let err = filer.mkdir("/Shared/file").await.unwrap_err();
    assert!(
        matches!(err, Error::CannotCreateDirectoryBecauseFileExists(_)),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_stat_directory() {
    let (remote, filer) = setup();
    remote.put_dir("/Repos/me/project");

    let info = filer.stat("/Repos/me/project").await.unwrap();
    assert!(info.is_dir);
    assert_eq!(info.name, "project");
    assert_eq!(info.metadata.unwrap().object_type, "DIRECTORY");
}
