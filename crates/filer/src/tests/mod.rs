mod conformance;
mod dbfs;
mod volumes;
mod workspace;

use crate::filer::Filer;
use tokio::io::AsyncReadExt;

/// Read a whole file through a filer
pub(crate) async fn read_all(filer: &dyn Filer, name: &str) -> Vec<u8> {
    let mut reader = filer.read(name).await.unwrap();
    let mut buf = Vec::new();
    _ = reader.read_to_end(&mut buf).await.unwrap();
    buf
}

/// Deterministic payload of `len` bytes that is not a repeating block
pub(crate) fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 7) % 251) as u8).collect()
}
