//! Reading profile photos off the UI thread.
//!
//! A load request gets a [`PhotoTicket`]. The worker thread sends its result
//! tagged with the ticket's generation; the editor only accepts the result for
//! the ticket it currently holds, and a cancelled ticket never applies.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use tracing::{debug, error, trace};

use crate::domain::DirError;
use crate::record::ImageRef;

pub const ALLOWED_MIME: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

#[derive(Debug, Clone)]
pub struct PhotoTicket {
    generation: u64,
    canceled: Arc<AtomicBool>,
}

impl PhotoTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct PhotoLoad {
    pub generation: u64,
    pub result: Result<ImageRef, DirError>,
}

pub struct PhotoLoader {
    tx: Sender<PhotoLoad>,
    rx: Receiver<PhotoLoad>,
    generation: u64,
    max_bytes: u64,
}

impl PhotoLoader {
    pub fn new(max_bytes: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
            max_bytes,
        }
    }

    /// Starts reading `path` in the background.
    pub fn request(&mut self, path: PathBuf) -> PhotoTicket {
        self.generation += 1;
        let ticket = PhotoTicket {
            generation: self.generation,
            canceled: Arc::new(AtomicBool::new(false)),
        };
        let worker_ticket = ticket.clone();
        let tx = self.tx.clone();
        let max_bytes = self.max_bytes;
        debug!("Photo load {} for {}", ticket.generation, path.display());

        thread::spawn(move || {
            if worker_ticket.is_canceled() {
                return;
            }
            let result = read_photo(&path, max_bytes);
            let load = PhotoLoad {
                generation: worker_ticket.generation,
                result,
            };
            if tx.send(load).is_err() {
                error!("Photo loader channel closed");
            }
        });
        ticket
    }

    /// Everything that finished since the last call.
    pub fn drain(&self) -> Vec<PhotoLoad> {
        self.rx.try_iter().collect()
    }

    pub fn wait(&self, timeout: Duration) -> Option<PhotoLoad> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Feeds a finished load as if a worker had sent it.
    #[cfg(test)]
    pub(crate) fn deliver(&self, load: PhotoLoad) {
        self.tx.send(load).unwrap();
    }
}

/// Checks size and signature, then embeds the file as a `data:` URI.
pub fn read_photo(path: &Path, max_bytes: u64) -> Result<ImageRef, DirError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DirError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => DirError::PermissionDenied(path.to_path_buf()),
        _ => DirError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DirError::PhotoRejected("not a file".into()));
    }
    if metadata.len() > max_bytes {
        return Err(DirError::PhotoRejected(format!(
            "{} bytes exceeds the {} byte limit",
            metadata.len(),
            max_bytes
        )));
    }

    let mut bytes = Vec::with_capacity(metadata.len() as usize);
    fs::File::open(path)?
        .take(max_bytes + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > max_bytes {
        return Err(DirError::PhotoRejected("file grew while reading".into()));
    }

    let mime = sniff_mime(&bytes)
        .filter(|m| ALLOWED_MIME.contains(m))
        .ok_or_else(|| {
            DirError::PhotoRejected(format!("only {} are accepted", ALLOWED_MIME.join(", ")))
        })?;
    trace!("Photo {} is {mime}, {} bytes", path.display(), bytes.len());
    Ok(ImageRef::new(format!(
        "data:{mime};base64,{}",
        BASE64_STANDARD.encode(&bytes)
    )))
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
