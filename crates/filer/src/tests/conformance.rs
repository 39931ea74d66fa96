//! Behaviour every backend must share, run against each of them.

use super::{payload, read_all};
use crate::dbfs::DbfsFiler;
use crate::error::Error;
use crate::filer::{DeleteMode, Filer, WriteMode, reader_from_bytes};
use crate::local::LocalFiler;
use crate::path::join;
use crate::testing::MemoryRemote;
use crate::volumes::VolumesFiler;
use crate::workspace::WorkspaceFiler;
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    name: &'static str,
    filer: Box<dyn Filer>,
    base: &'static str,
    _temp: Option<TempDir>,
}

impl Fixture {
    fn path(&self, rel: &str) -> String {
        join(self.base, rel)
    }
}

async fn fixtures() -> Vec<Fixture> {
    let temp_dir = TempDir::new().unwrap();
    let local = Fixture {
        name: "local",
        filer: Box::new(LocalFiler::new(temp_dir.path().to_str().unwrap())),
        base: "/",
        _temp: Some(temp_dir),
    };
    let dbfs = Fixture {
        name: "dbfs",
        filer: Box::new(DbfsFiler::new(Arc::new(MemoryRemote::new()), "/")),
        base: "/data",
        _temp: None,
    };
    let workspace = Fixture {
        name: "workspace",
        filer: Box::new(WorkspaceFiler::new(Arc::new(MemoryRemote::new()), "/")),
        base: "/Users/someone",
        _temp: None,
    };
    let volumes = Fixture {
        name: "volumes",
        filer: Box::new(VolumesFiler::new(Arc::new(MemoryRemote::new()), "/")),
        base: "/Volumes/main/default/vol",
        _temp: None,
    };

    let fixtures = vec![local, dbfs, workspace, volumes];
    for f in &fixtures {
        f.filer.mkdir(f.base).await.unwrap();
    }
    fixtures
}

#[tokio::test]
async fn test_write_read_round_trip() {
    // Spans several 1 MiB blocks with a short tail
    let data = payload(2 * 1024 * 1024 + 123);
    for f in fixtures().await {
        let path = f.path("blob.bin");
        f.filer
            .write(&path, reader_from_bytes(data.clone()), WriteMode::default())
            .await
            .unwrap();
        assert_eq!(read_all(f.filer.as_ref(), &path).await, data, "{}", f.name);

        let info = f.filer.stat(&path).await.unwrap();
        assert_eq!(info.name, "blob.bin", "{}", f.name);
        assert!(!info.is_dir, "{}", f.name);
        assert_eq!(info.size, Some(data.len() as i64), "{}", f.name);
    }
}

#[tokio::test]
async fn test_empty_file() {
    for f in fixtures().await {
        let path = f.path("empty");
        f.filer
            .write(&path, reader_from_bytes(Vec::new()), WriteMode::default())
            .await
            .unwrap();
        assert!(read_all(f.filer.as_ref(), &path).await.is_empty(), "{}", f.name);
    }
}

#[tokio::test]
async fn test_overwrite_semantics() {
    for f in fixtures().await {
        let path = f.path("f.txt");
        f.filer
            .write(&path, reader_from_bytes("first"), WriteMode::default())
            .await
            .unwrap();

        let err = f
            .filer
            .write(&path, reader_from_bytes("second"), WriteMode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileAlreadyExists(_)), "{}: {err:?}", f.name);
        assert_eq!(read_all(f.filer.as_ref(), &path).await, b"first", "{}", f.name);

        f.filer
            .write(
                &path,
                reader_from_bytes("third"),
                WriteMode::OVERWRITE_IF_EXISTS,
            )
            .await
            .unwrap();
        assert_eq!(read_all(f.filer.as_ref(), &path).await, b"third", "{}", f.name);
    }
}

#[tokio::test]
async fn test_missing_parent() {
    for f in fixtures().await {
        let path = f.path("a/b/c.txt");
        let err = f
            .filer
            .write(&path, reader_from_bytes("x"), WriteMode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchDirectory(_)), "{}: {err:?}", f.name);

        f.filer
            .write(
                &path,
                reader_from_bytes("x"),
                WriteMode::CREATE_PARENT_DIRECTORIES,
            )
            .await
            .unwrap();
        assert!(f.filer.stat(&f.path("a/b")).await.unwrap().is_dir, "{}", f.name);
        assert_eq!(read_all(f.filer.as_ref(), &path).await, b"x", "{}", f.name);
    }
}

#[tokio::test]
async fn test_mkdir_is_idempotent() {
    for f in fixtures().await {
        let dir = f.path("x/y");
        f.filer.mkdir(&dir).await.unwrap();
        f.filer.mkdir(&dir).await.unwrap();

        let entries = f.filer.read_dir(&f.path("x")).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["y"], "{}", f.name);
        assert!(entries[0].is_dir, "{}", f.name);
    }
}

#[tokio::test]
async fn test_read_dir_sorted_unique() {
    for f in fixtures().await {
        for name in ["delta", "alpha", "charlie"] {
            f.filer
                .write(&f.path(name), reader_from_bytes(name), WriteMode::default())
                .await
                .unwrap();
        }
        f.filer.mkdir(&f.path("bravo")).await.unwrap();

        let entries = f.filer.read_dir(f.base).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(
            names,
            vec!["alpha", "bravo", "charlie", "delta"],
            "{}",
            f.name
        );
        assert!(entries[1].is_dir, "{}", f.name);
        assert!(!entries[0].is_dir, "{}", f.name);
    }
}

#[tokio::test]
async fn test_read_dir_errors() {
    for f in fixtures().await {
        let file = f.path("file");
        f.filer
            .write(&file, reader_from_bytes("x"), WriteMode::default())
            .await
            .unwrap();

        let err = f.filer.read_dir(&f.path("missing")).await.unwrap_err();
        assert!(matches!(err, Error::NoSuchDirectory(_)), "{}: {err:?}", f.name);

        let err = f.filer.read_dir(&file).await.unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)), "{}: {err:?}", f.name);
    }
}

#[tokio::test]
async fn test_read_errors() {
    for f in fixtures().await {
        f.filer.mkdir(&f.path("dir")).await.unwrap();

        let err = f.filer.read(&f.path("missing")).await.err().unwrap();
        assert!(matches!(err, Error::FileDoesNotExist(_)), "{}: {err:?}", f.name);

        let err = f.filer.read(&f.path("dir")).await.err().unwrap();
        assert!(matches!(err, Error::NotAFile(_)), "{}: {err:?}", f.name);
    }
}

#[tokio::test]
async fn test_delete() {
    for f in fixtures().await {
        f.filer
            .write(
                &f.path("d/e/f.txt"),
                reader_from_bytes("x"),
                WriteMode::CREATE_PARENT_DIRECTORIES,
            )
            .await
            .unwrap();

        let err = f
            .filer
            .delete(&f.path("missing"), DeleteMode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileDoesNotExist(_)), "{}: {err:?}", f.name);

        let err = f
            .filer
            .delete(&f.path("d"), DeleteMode::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DirectoryNotEmpty(_)), "{}: {err:?}", f.name);

        f.filer
            .delete(&f.path("d"), DeleteMode::RECURSIVE)
            .await
            .unwrap();
        let err = f.filer.stat(&f.path("d/e/f.txt")).await.unwrap_err();
        assert!(matches!(err, Error::FileDoesNotExist(_)), "{}: {err:?}", f.name);
        let err = f.filer.stat(&f.path("d")).await.unwrap_err();
        assert!(matches!(err, Error::FileDoesNotExist(_)), "{}: {err:?}", f.name);
    }
}

#[tokio::test]
async fn test_stat_missing() {
    for f in fixtures().await {
        let err = f.filer.stat(&f.path("nothing")).await.unwrap_err();
        assert!(err.is_not_found(), "{}: {err:?}", f.name);
    }
}

#[tokio::test]
async fn test_escape_is_rejected() {
    for f in fixtures().await {
        let err = f.filer.stat("../outside").await.unwrap_err();
        assert!(matches!(err, Error::PathEscapesRoot(_)), "{}: {err:?}", f.name);
    }
}
