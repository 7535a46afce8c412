use std::path::Path;

use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{dto::UploadResponse, repo_types::NewUploadedFile};
use crate::{
    error::{AppError, AppResult},
    spreadsheet::{self, decode_blocking},
    state::AppState,
};

pub const PREVIEW_ROWS: usize = 10;
const ALLOWED_EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

/// One file taken from the multipart body.
pub struct Upload {
    pub original_name: String,
    pub body: Bytes,
}

pub(crate) fn is_excel_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// `<uploadMillis>-<originalName>`, with any client-side directories stripped.
pub(crate) fn storage_filename(original_name: &str, at: OffsetDateTime) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{millis}-{base}")
}

/// Validates, decodes, stores and registers an uploaded workbook.
pub async fn ingest(state: &AppState, owner_id: Uuid, upload: Upload) -> AppResult<UploadResponse> {
    // Client-side paths (and Windows separators) are not part of the name.
    let original_name = upload
        .original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string();

    if !is_excel_filename(&original_name) {
        warn!(%owner_id, name = %original_name, "rejected non-excel upload");
        return Err(AppError::Validation("Only Excel files are allowed".into()));
    }
    if upload.body.len() > state.config.max_upload_bytes {
        return Err(AppError::Validation("File too large".into()));
    }

    let sheet = decode_blocking(upload.body.clone(), spreadsheet::parse).await??;

    let filename = storage_filename(&original_name, OffsetDateTime::now_utc());
    let path = state.storage.put_object(&filename, upload.body.clone()).await?;

    let registered = state
        .files
        .register(NewUploadedFile {
            user_id: owner_id,
            filename,
            original_name,
            path: path.clone(),
            headers: sheet.headers.clone(),
            row_count: sheet.rows.len() as i64,
            file_size: upload.body.len() as i64,
        })
        .await;
    let file = match registered {
        Ok(file) => file,
        Err(e) => {
            // Stored bytes without a registry entry are unreachable.
            if let Err(cleanup) = state.storage.delete_object(&path).await {
                warn!(error = ?cleanup, %path, "orphaned upload not removed");
            }
            return Err(e.into());
        }
    };

    info!(file_id = %file.id, %owner_id, rows = file.row_count, size = file.file_size, "file registered");

    Ok(UploadResponse {
        message: "File uploaded successfully",
        file_id: file.id,
        preview_rows: sheet.preview(PREVIEW_ROWS).to_vec(),
        headers: sheet.headers,
        total_rows: sheet.rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        files::{FileRepo, UploadedFile},
        spreadsheet::{
            fixtures::{empty_workbook, month_sales, text, workbook_bytes},
            Cell,
        },
        storage::LocalStorage,
    };
    use async_trait::async_trait;
    use std::sync::Arc;
    use time::macros::datetime;

    fn upload(name: &str, body: Vec<u8>) -> Upload {
        Upload {
            original_name: name.into(),
            body: Bytes::from(body),
        }
    }

    #[test]
    fn only_excel_extensions() {
        assert!(is_excel_filename("report.xlsx"));
        assert!(is_excel_filename("OLD.XLS"));
        assert!(!is_excel_filename("data.csv"));
        assert!(!is_excel_filename("xlsx"));
        assert!(!is_excel_filename(""));
    }

    #[test]
    fn storage_name_is_millis_dash_original() {
        let at = datetime!(2024-01-02 03:04:05.678 UTC);
        assert_eq!(
            storage_filename("sales.xlsx", at),
            format!("{}-sales.xlsx", at.unix_timestamp() * 1000 + 678)
        );
        assert!(storage_filename("../../etc/sales.xlsx", at).ends_with("-sales.xlsx"));
    }

    #[tokio::test]
    async fn ingest_registers_and_previews() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();

        let res = ingest(&state, owner, upload("sales.xlsx", month_sales()))
            .await
            .unwrap();
        assert_eq!(res.headers, vec!["Month", "Sales"]);
        assert_eq!(res.total_rows, 3);
        assert_eq!(res.preview_rows[1], vec![text("Feb"), Cell::Int(150)]);

        let file = state.files.get(res.file_id, owner).await.unwrap().unwrap();
        assert_eq!(file.original_name, "sales.xlsx");
        assert!(file.filename.ends_with("-sales.xlsx"));
        assert_eq!(file.row_count, 3);
        assert_eq!(file.file_size, month_sales().len() as i64);
        assert!(file.analysis_ids.is_empty());

        let stored = state.storage.get_object(&file.path).await.unwrap();
        assert_eq!(stored.len() as i64, file.file_size);
    }

    #[tokio::test]
    async fn preview_is_limited_to_ten_rows() {
        let state = AppState::fake();
        let mut rows = vec![vec![text("n")]];
        rows.extend((0..30).map(|i| vec![Cell::Int(i)]));

        let res = ingest(&state, Uuid::new_v4(), upload("big.xlsx", workbook_bytes(&rows)))
            .await
            .unwrap();
        assert_eq!(res.total_rows, 30);
        assert_eq!(res.preview_rows.len(), PREVIEW_ROWS);
    }

    #[tokio::test]
    async fn rejects_wrong_extension_empty_and_oversized() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();

        assert!(matches!(
            ingest(&state, owner, upload("sales.csv", month_sales())).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ingest(&state, owner, upload("empty.xlsx", empty_workbook())).await,
            Err(AppError::EmptyFile)
        ));
        let too_big = vec![0u8; state.config.max_upload_bytes + 1];
        assert!(matches!(
            ingest(&state, owner, upload("huge.xlsx", too_big)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ingest(&state, owner, upload("junk.xlsx", b"junk".to_vec())).await,
            Err(AppError::Validation(_))
        ));
        assert!(state.files.list_for_owner(owner).await.unwrap().is_empty());
    }

    struct UnavailableRegistry;

    #[async_trait]
    impl FileRepo for UnavailableRegistry {
        async fn register(&self, _new: NewUploadedFile) -> anyhow::Result<UploadedFile> {
            anyhow::bail!("registry unavailable")
        }
        async fn list_for_owner(&self, _owner_id: Uuid) -> anyhow::Result<Vec<UploadedFile>> {
            Ok(Vec::new())
        }
        async fn get(
            &self,
            _file_id: Uuid,
            _owner_id: Uuid,
        ) -> anyhow::Result<Option<UploadedFile>> {
            Ok(None)
        }
        async fn get_many(&self, _file_ids: &[Uuid]) -> anyhow::Result<Vec<UploadedFile>> {
            Ok(Vec::new())
        }
        async fn link_analysis(&self, _file_id: Uuid, _analysis_id: Uuid) -> anyhow::Result<()> {
            Ok(())
        }
        async fn count(&self) -> anyhow::Result<i64> {
            Ok(0)
        }
        async fn total_size(&self) -> anyhow::Result<i64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn failed_registration_removes_stored_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::fake();
        state.storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        state.files = Arc::new(UnavailableRegistry);

        let err = ingest(&state, Uuid::new_v4(), upload("sales.xlsx", month_sales()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
