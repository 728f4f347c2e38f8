//! Plain-file secure storage fallback
//!
//! Used when no managed host runtime (and therefore no platform keystore) is
//! present. Each key maps to one file whose entire content is the value.
//! Nothing is encrypted; this backend exists so the bridge keeps working on
//! development machines and in headless test environments.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bridge_traits::{
    codec::{RawResult, ResultCodec},
    context::ContextHandle,
    error::Result,
    outcome::{Outcome, StatusCode},
    storage::{SecretKey, SecureStore},
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::context::ProcessContext;

/// Failure message reported when no file exists for a key.
pub const FILE_NOT_FOUND: &str = "encrypted file not found";

/// File-per-key storage backend.
///
/// # Root directory
///
/// 1. The directory passed to [`FileSecureStore::with_directory`].
/// 2. The working directory of the [`ProcessContext`] carried by the call's
///    context handle.
/// 3. The process's current directory.
///
/// # File names
///
/// Keys are percent-encoded, so `"apple"` is stored in `apple` while
/// `"wallet/seed"` becomes `wallet%2Fseed`. A leading `.` is additionally
/// encoded as `%2E`, so no key yields a hidden file, `.` or `..`.
pub struct FileSecureStore {
    directory: Option<PathBuf>,
    io_lock: Mutex<()>,
}

impl FileSecureStore {
    /// Store files relative to the caller's working directory.
    pub fn new() -> Self {
        Self {
            directory: None,
            io_lock: Mutex::new(()),
        }
    }

    /// Store files under `directory`, creating it on first write.
    pub fn with_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            io_lock: Mutex::new(()),
        }
    }

    /// File name a key is stored under.
    pub fn file_name(key: &SecretKey) -> String {
        let encoded = urlencoding::encode(key.as_str());
        match encoded.strip_prefix('.') {
            Some(rest) => format!("%2E{}", rest),
            None => encoded.into_owned(),
        }
    }

    fn root(&self, context: &ContextHandle) -> Cow<'_, Path> {
        if let Some(directory) = &self.directory {
            return Cow::Borrowed(directory.as_path());
        }

        match context.downcast_ref::<ProcessContext>() {
            Some(process) => Cow::Owned(process.working_dir.clone()),
            None => Cow::Borrowed(Path::new(".")),
        }
    }

    fn path_for(&self, context: &ContextHandle, file: &str) -> PathBuf {
        self.root(context).join(file)
    }

    async fn write_file(&self, path: &Path, value: &str) -> std::io::Result<()> {
        if let Some(directory) = &self.directory {
            fs::create_dir_all(directory).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;

        file.write_all(value.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl Default for FileSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for FileSecureStore {
    async fn write(
        &self,
        context: &ContextHandle,
        key: &SecretKey,
        value: &str,
    ) -> Result<StatusCode> {
        let file = Self::file_name(key);
        let path = self.path_for(context, &file);
        let _guard = self.io_lock.lock().await;

        match self.write_file(&path, value).await {
            Ok(()) => {
                debug!(key = %key, file = %file, size = value.len(), "Wrote secret file");
                Ok(StatusCode::SUCCESS)
            }
            Err(e) => {
                warn!(key = %key, file = %file, error = %e, "Failed to write secret file");
                Ok(StatusCode::FAILURE)
            }
        }
    }

    async fn read(&self, context: &ContextHandle, key: &SecretKey) -> Result<RawResult> {
        let file = Self::file_name(key);
        let path = self.path_for(context, &file);
        let _guard = self.io_lock.lock().await;

        let outcome = match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(key = %key, file = %file, size = content.len(), "Read secret file");
                Outcome::success(content)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, file = %file, "Secret file not found");
                Outcome::failure(FILE_NOT_FOUND)
            }
            Err(e) => {
                warn!(key = %key, file = %file, error = %e, "Failed to read secret file");
                Outcome::failure(format!("failed to read encrypted file: {}", e))
            }
        };

        Ok(RawResult::Json(ResultCodec::encode_json(&outcome)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SecretKey {
        SecretKey::parse(s).unwrap()
    }

    fn context() -> ContextHandle {
        ContextHandle::new("test", ())
    }

    #[test]
    fn test_file_names() {
        assert_eq!(FileSecureStore::file_name(&key("apple")), "apple");
        assert_eq!(FileSecureStore::file_name(&key("a-b_c.d~e")), "a-b_c.d~e");
        assert_eq!(
            FileSecureStore::file_name(&key("../etc/passwd")),
            "%2E.%2Fetc%2Fpasswd"
        );
        assert_eq!(FileSecureStore::file_name(&key(".hidden")), "%2Ehidden");
        assert_eq!(
            FileSecureStore::file_name(&key("wallet/mnemonic")),
            "wallet%2Fmnemonic"
        );
    }

    #[test]
    fn test_distinct_keys_get_distinct_files() {
        let a = FileSecureStore::file_name(&key("a/b"));
        let b = FileSecureStore::file_name(&key("a%2Fb"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecureStore::with_directory(dir.path());

        let status = store.write(&context(), &key("apple"), "hello").await.unwrap();
        assert_eq!(status, StatusCode::SUCCESS);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("apple")).unwrap(),
            "hello"
        );

        let raw = store.read(&context(), &key("apple")).await.unwrap();
        assert_eq!(ResultCodec::decode(&raw).unwrap(), Outcome::success("hello"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecureStore::with_directory(dir.path());

        let raw = store.read(&context(), &key("missing")).await.unwrap();
        assert_eq!(
            raw,
            RawResult::Json(
                r#"{"result":"","success":"0","error":"encrypted file not found"}"#.to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_overwrite_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecureStore::with_directory(dir.path());

        store
            .write(&context(), &key("k"), "a much longer first value")
            .await
            .unwrap();
        store.write(&context(), &key("k"), "short").await.unwrap();

        let raw = store.read(&context(), &key("k")).await.unwrap();
        assert_eq!(ResultCodec::decode(&raw).unwrap(), Outcome::success("short"));
    }

    #[tokio::test]
    async fn test_root_from_process_context() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecureStore::new();
        let context = ContextHandle::new(
            "process",
            ProcessContext {
                pid: std::process::id(),
                working_dir: dir.path().to_path_buf(),
            },
        );

        let status = store.write(&context, &key("apple"), "v").await.unwrap();
        assert!(status.is_success());
        assert!(dir.path().join("apple").exists());
    }

    #[tokio::test]
    async fn test_unwritable_directory_reports_failure_status() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let store = FileSecureStore::with_directory(&blocker);

        let status = store.write(&context(), &key("k"), "v").await.unwrap();
        assert_eq!(status, StatusCode::FAILURE);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_logs_name_files_without_directory() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let store = FileSecureStore::with_directory(dir.path());
        store.write(&context(), &key("wallet/seed"), "v").await.unwrap();
        store.read(&context(), &key("wallet/seed")).await.unwrap();
        store.read(&context(), &key("missing")).await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("wallet%2Fseed"));
        assert!(output.contains("Secret file not found"));
        assert!(!output.contains(&*dir.path().to_string_lossy()));
    }
}
