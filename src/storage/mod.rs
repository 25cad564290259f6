use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioRole {
    Word,
    Example1,
    Example2,
}

impl AudioRole {
    pub const ALL: [AudioRole; 3] = [AudioRole::Word, AudioRole::Example1, AudioRole::Example2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Example1 => "example1",
            Self::Example2 => "example2",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "word" => Some(Self::Word),
            "example1" => Some(Self::Example1),
            "example2" => Some(Self::Example2),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("audio artifact not found")]
    NotFound,
    #[error("artifact store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio blobs addressed by `(card id, role)`. Locations are deterministic,
/// so rewriting for the same card overwrites in place.
#[async_trait]
pub trait AudioStore: Send + Sync {
    /// Deterministic location for `(id, role)`; does not touch storage.
    fn location(&self, id: &str, role: AudioRole) -> String;

    async fn write(&self, id: &str, role: AudioRole, bytes: &[u8]) -> Result<String, ArtifactError>;

    async fn read(&self, id: &str, role: AudioRole) -> Result<Bytes, ArtifactError>;

    /// Idempotent: deleting a missing artifact is not an error.
    async fn delete(&self, id: &str, role: AudioRole) -> Result<(), ArtifactError>;

    async fn delete_all(&self, id: &str) -> Result<(), ArtifactError> {
        for role in AudioRole::ALL {
            self.delete(id, role).await?;
        }
        Ok(())
    }

    async fn exists(&self, id: &str, role: AudioRole) -> bool;
}

#[derive(Debug, Clone)]
pub struct FsAudioStore {
    dir: PathBuf,
}

impl FsAudioStore {
    /// Creating the backing directory is idempotent; an existing directory
    /// is left untouched.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str, role: AudioRole) -> PathBuf {
        self.dir.join(format!("{id}_{}.mp3", role.as_str()))
    }
}

#[async_trait]
impl AudioStore for FsAudioStore {
    fn location(&self, id: &str, role: AudioRole) -> String {
        self.path_for(id, role).to_string_lossy().into_owned()
    }

    async fn write(&self, id: &str, role: AudioRole, bytes: &[u8]) -> Result<String, ArtifactError> {
        let path = self.path_for(id, role);
        tokio::fs::write(&path, bytes).await?;
        Ok(path.to_string_lossy().into_owned())
    }

    async fn read(&self, id: &str, role: AudioRole) -> Result<Bytes, ArtifactError> {
        let path = self.path_for(id, role);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ArtifactError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: &str, role: AudioRole) -> Result<(), ArtifactError> {
        let path = self.path_for(id, role);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, id: &str, role: AudioRole) -> bool {
        tokio::fs::try_exists(self.path_for(id, role)).await.unwrap_or(false)
    }
}
