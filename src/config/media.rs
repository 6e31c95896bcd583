use std::env;

/// Where uploaded media lands on disk. The directory is served read-only
/// under `/uploads`, so a stored asset's URL is `/uploads/{public_id}`.
#[derive(Clone)]
pub struct MediaConfig {
    pub root_dir: String,
}

impl MediaConfig {
    pub fn from_env() -> Self {
        let root_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        Self { root_dir }
    }
}
