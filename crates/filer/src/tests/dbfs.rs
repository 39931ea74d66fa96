use super::{payload, read_all};
use crate::dbfs::{CHUNK_SIZE, DbfsFiler};
use crate::error::Error;
use crate::filer::{FileReader, Filer, WriteMode, reader_from_bytes};
use crate::testing::MemoryRemote;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

fn setup() -> (MemoryRemote, DbfsFiler) {
    let remote = MemoryRemote::new();
    let filer = DbfsFiler::new(Arc::new(remote.clone()), "/");
    (remote, filer)
}

fn count(remote: &MemoryRemote, prefix: &str) -> usize {
    remote
        .calls()
        .iter()
        .filter(|call| call.starts_with(prefix))
        .count()
}

#[tokio::test]
async fn test_upload_is_chunked() {
    let (remote, filer) = setup();
    let data = payload(2 * CHUNK_SIZE + 1);
    filer
        .write(
            "/big.bin",
            reader_from_bytes(data.clone()),
            WriteMode::default(),
        )
        .await
        .unwrap();

    assert_eq!(count(&remote, "dbfs.add-block"), 3);
    assert_eq!(count(&remote, "dbfs.close"), 1);
    assert_eq!(remote.file("/big.bin").unwrap(), data);
}

#[tokio::test]
async fn test_exact_multiple_of_chunk() {
    let (remote, filer) = setup();
    let data = payload(CHUNK_SIZE);
    filer
        .write("/one.bin", reader_from_bytes(data.clone()), WriteMode::default())
        .await
        .unwrap();
    assert_eq!(count(&remote, "dbfs.add-block"), 1);

    assert_eq!(read_all(&filer, "/one.bin").await, data);
    // One full window, then an empty one ends the read
    assert_eq!(count(&remote, "dbfs.read"), 2);
}

#[tokio::test]
async fn test_read_is_windowed() {
    let (remote, filer) = setup();
    let data = payload(CHUNK_SIZE + CHUNK_SIZE / 2);
    remote.put_file("/f", data.clone());

    assert_eq!(read_all(&filer, "/f").await, data);
    assert_eq!(count(&remote, "dbfs.read"), 2);
}

/// Yields some bytes, then fails
struct BrokenReader {
    sent: bool,
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.sent {
            return Poll::Ready(Err(std::io::Error::other("disk on fire")));
        }
        self.sent = true;
        buf.put_slice(b"partial");
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_failed_upload_still_closes() {
    let (remote, filer) = setup();
    let reader: FileReader = Box::pin(BrokenReader { sent: false });

    let err = filer
        .write("/broken", reader, WriteMode::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk on fire"), "{err}");
    assert_eq!(count(&remote, "dbfs.close"), 1);
}

#[tokio::test]
async fn test_mkdir_over_file() {
    let (remote, filer) = setup();
    remote.put_file("/a/file", "x");

    let err = filer.mkdir("/a/file/sub").await.unwrap_err();
    assert!(
        matches!(err, Error::CannotCreateDirectoryBecauseFileExists(_)),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_backend_error_is_verbatim() {
    let (remote, filer) = setup();
    remote.fail_path(
        "/locked",
        crate::api::ApiError::status(403, "PERMISSION_DENIED", "User cannot read /locked"),
    );

    let err = filer.stat("/locked").await.unwrap_err();
    assert_eq!(err.to_string(), "User cannot read /locked");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_root_confines_paths() {
    let remote = MemoryRemote::new();
    remote.put_file("/base/inner.txt", "in");
    remote.put_file("/secret.txt", "out");
    let filer = DbfsFiler::new(Arc::new(remote), "/base");

    assert_eq!(read_all(&filer, "inner.txt").await, b"in");
    assert_eq!(read_all(&filer, "/inner.txt").await, b"in");
    assert!(matches!(
        filer.stat("../secret.txt").await.unwrap_err(),
        Error::PathEscapesRoot(_)
    ));
}
