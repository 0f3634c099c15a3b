use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// Collects analyzed images for the external retraining pipeline, content
/// addressed so repeated uploads of the same photo do not pile up.
#[derive(Clone)]
pub struct DatasetCollector {
    dir: PathBuf,
}

impl DatasetCollector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn image_hash(image: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image);
        hex::encode(hasher.finalize())
    }

    pub fn store(&self, image: &[u8], mime_type: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let extension = match mime_type {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        };
        let path = self
            .dir
            .join(format!("{}.{extension}", Self::image_hash(image)));

        if !path.exists() {
            fs::write(&path, image)?;
        }
        Ok(path)
    }

    pub fn has_samples(&self) -> bool {
        fs::read_dir(&self.dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_collector() -> DatasetCollector {
        DatasetCollector::new(std::env::temp_dir().join(format!("dataset-{}", Uuid::new_v4())))
    }

    #[test]
    fn stores_and_deduplicates_by_content() {
        let collector = temp_collector();
        assert!(!collector.has_samples());

        let first = collector.store(b"fake image bytes", "image/jpeg").unwrap();
        let second = collector.store(b"fake image bytes", "image/jpeg").unwrap();
        assert_eq!(first, second);
        assert!(collector.has_samples());
    }

    #[test]
    fn extension_follows_mime_type() {
        let collector = temp_collector();
        let path = collector.store(b"png bytes", "image/png").unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }
}
