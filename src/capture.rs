//! Optional raw-sample and validated-message capture to disk.
//!
//! Both capture sinks are buffered-writer tasks fed by an `mpsc` channel, so
//! a slow disk never backs up into the demodulation hot path: the caller
//! just clones the sender and keeps going, and the spawned task owns the
//! actual file handle and flushing.

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ReceiverError;
use crate::protocol::Message;

const CAPTURE_CHANNEL_CAPACITY: usize = 64;

/// A running raw-byte capture sink: clone `sender` into the producer path,
/// drop it (or send nothing further) and `join` to flush and close the
/// file.
pub struct RawCapture {
    pub sender: mpsc::Sender<Vec<u8>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl RawCapture {
    pub async fn open(path: PathBuf) -> Result<Self, ReceiverError> {
        let file = File::create(&path).await.map_err(ReceiverError::CaptureIo)?;
        let (sender, mut rx) = mpsc::channel::<Vec<u8>>(CAPTURE_CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            let mut writer = BufWriter::new(file);
            while let Some(block) = rx.recv().await {
                writer.write_all(&block).await?;
            }
            writer.flush().await
        });
        Ok(RawCapture { sender, task })
    }

    pub async fn join(self) -> Result<(), ReceiverError> {
        drop(self.sender);
        self.task
            .await
            .map_err(|e| ReceiverError::CaptureIo(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
            .map_err(ReceiverError::CaptureIo)
    }
}

/// A running validated-message capture sink: one line of debug-formatted
/// output per message. A line-oriented text dump rather than a structured
/// format, matching the CLI's `-v` logging register rather than introducing
/// a machine-readable export format the spec doesn't ask for.
pub struct MessageCapture {
    pub sender: mpsc::Sender<Message>,
    task: JoinHandle<std::io::Result<()>>,
}

impl MessageCapture {
    pub async fn open(path: PathBuf) -> Result<Self, ReceiverError> {
        let file = File::create(&path).await.map_err(ReceiverError::CaptureIo)?;
        let (sender, mut rx) = mpsc::channel::<Message>(CAPTURE_CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            let mut writer = BufWriter::new(file);
            while let Some(message) = rx.recv().await {
                writer.write_all(format!("{message:?}\n").as_bytes()).await?;
            }
            writer.flush().await
        });
        Ok(MessageCapture { sender, task })
    }

    pub async fn join(self) -> Result<(), ReceiverError> {
        drop(self.sender);
        self.task
            .await
            .map_err(|e| ReceiverError::CaptureIo(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
            .map_err(ReceiverError::CaptureIo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn raw_capture_writes_sent_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        let capture = RawCapture::open(path.clone()).await.unwrap();
        capture.sender.send(vec![1, 2, 3]).await.unwrap();
        capture.sender.send(vec![4, 5]).await.unwrap();
        capture.join().await.unwrap();

        let contents = tokio::fs::read(&path).await.unwrap();
        assert_eq!(contents, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn message_capture_writes_one_line_per_message() {
        use crate::protocol::message::SensorReading;

        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.log");
        let capture = MessageCapture::open(path.clone()).await.unwrap();
        let message = Message {
            station_id: 4,
            low_battery: false,
            wind_speed: 3,
            wind_direction_deg: 180.0,
            sensor: SensorReading::Temperature(21.5),
            freq_error_hz: -9600.0,
        };
        capture.sender.send(message).await.unwrap();
        capture.join().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("Temperature"));
    }
}
