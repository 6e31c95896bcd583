use crate::config::media::MediaConfig;
use crate::error::{AppError, AppResult};
use crate::models::MediaRef;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50 MB

/// File extensions accepted for avatars, thumbnails and lecture media.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "webp", "png", "mp4"];

/// Validate file magic bytes match the extension the name claims.
fn validate_magic_bytes(data: &[u8], ext: &str) -> bool {
    match ext {
        "jpg" | "jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        // ISO BMFF: size box then 'ftyp'
        "mp4" => data.len() >= 12 && &data[4..8] == b"ftyp",
        _ => false,
    }
}

fn normalized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Disk-backed media store. Assets are addressed by a `public_id` of the
/// form `{subdirectory}/{uuid}.{ext}` and served under `/uploads/`.
pub struct MediaStore;

impl MediaStore {
    /// Persist an uploaded file and return its `{public_id, url}` pair.
    pub async fn store(
        config: &MediaConfig,
        data: &[u8],
        original_name: &str,
        subdirectory: &str,
    ) -> AppResult<MediaRef> {
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::PayloadTooLarge);
        }

        let ext = normalized_extension(original_name).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported file type! Allowed: .jpg, .jpeg, .webp, .png, .mp4 (got '{}')",
                original_name
            ))
        })?;

        if !validate_magic_bytes(data, &ext) {
            return Err(AppError::Validation(
                "File content does not match its extension".to_string(),
            ));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.root_dir).join(subdirectory);

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create upload directory: {}", e))
        })?;

        let file_path = dir.join(&filename);
        if let Err(e) = fs::write(&file_path, data).await {
            // Remove whatever made it to disk before surfacing the error.
            let _ = fs::remove_file(&file_path).await;
            return Err(AppError::Internal(anyhow::anyhow!(
                "Failed to write file: {}",
                e
            )));
        }

        let public_id = format!("{}/{}", subdirectory, filename);
        let url = format!("/uploads/{}", public_id);
        Ok(MediaRef { public_id, url })
    }

    /// Delete a stored asset by id. Missing files are treated as already
    /// deleted.
    pub async fn delete(config: &MediaConfig, public_id: &str) -> AppResult<()> {
        if public_id.is_empty()
            || public_id.starts_with('/')
            || public_id.split('/').any(|part| part == "..")
        {
            return Err(AppError::Validation(format!(
                "Invalid media id '{}'",
                public_id
            )));
        }

        let file_path = Path::new(&config.root_dir).join(public_id);
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Failed to delete media '{}': {}",
                public_id,
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_magic_bytes_valid() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert!(validate_magic_bytes(&data, "jpg"));
        assert!(validate_magic_bytes(&data, "jpeg"));
    }

    #[test]
    fn png_magic_bytes_valid() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];
        assert!(validate_magic_bytes(&data, "png"));
    }

    #[test]
    fn webp_magic_bytes_valid() {
        let data = [
            0x52, 0x49, 0x46, 0x46, // RIFF
            0x00, 0x00, 0x00, 0x00, // size
            0x57, 0x45, 0x42, 0x50, // WEBP
        ];
        assert!(validate_magic_bytes(&data, "webp"));
    }

    #[test]
    fn mp4_magic_bytes_valid() {
        let mut data = vec![0x00, 0x00, 0x00, 0x18];
        data.extend_from_slice(b"ftypisom");
        assert!(validate_magic_bytes(&data, "mp4"));
    }

    #[test]
    fn wrong_magic_bytes_rejected() {
        let png_data = [0x89, 0x50, 0x4E, 0x47];
        assert!(!validate_magic_bytes(&png_data, "jpg"));
        assert!(!validate_magic_bytes(&[], "png"));
    }

    #[test]
    fn extension_allow_list() {
        assert_eq!(normalized_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(normalized_extension("clip.mp4").as_deref(), Some("mp4"));
        assert_eq!(normalized_extension("doc.pdf"), None);
        assert_eq!(normalized_extension("no_extension"), None);
        assert_eq!(normalized_extension("archive.tar.gz"), None);
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal() {
        let config = MediaConfig {
            root_dir: "./test_uploads".to_string(),
        };
        assert!(MediaStore::delete(&config, "../etc/passwd").await.is_err());
        assert!(MediaStore::delete(&config, "/etc/passwd").await.is_err());
        assert!(MediaStore::delete(&config, "avatars/../../secret")
            .await
            .is_err());
        assert!(MediaStore::delete(&config, "").await.is_err());
    }

    #[tokio::test]
    async fn delete_missing_file_is_ok() {
        let config = MediaConfig {
            root_dir: "./test_uploads".to_string(),
        };
        assert!(MediaStore::delete(&config, "avatars/does-not-exist.png")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn store_and_delete_round_trip() {
        let config = MediaConfig {
            root_dir: "./test_uploads".to_string(),
        };
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let asset = MediaStore::store(&config, &data, "avatar.png", "avatars")
            .await
            .unwrap();
        assert!(asset.public_id.starts_with("avatars/"));
        assert_eq!(asset.url, format!("/uploads/{}", asset.public_id));
        MediaStore::delete(&config, &asset.public_id).await.unwrap();
    }

    #[tokio::test]
    async fn store_rejects_disallowed_extension() {
        let config = MediaConfig {
            root_dir: "./test_uploads".to_string(),
        };
        let err = MediaStore::store(&config, &[0u8; 4], "malware.exe", "avatars")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn store_rejects_oversized_payload() {
        let config = MediaConfig {
            root_dir: "./test_uploads".to_string(),
        };
        let data = vec![0u8; MAX_FILE_SIZE + 1];
        let err = MediaStore::store(&config, &data, "big.png", "avatars")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge));
    }
}
