//! Writing received parts into the upload directory.

use std::{
    ffi::OsString,
    io,
    path::{MAIN_SEPARATOR_STR, Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::instrument;

use super::{Part, PartOutcome, StoredFile, UploadError, UploadLog, UploadReport, filename};

/// Create `upload_dir` and any missing parents. Succeeds if it already exists.
#[instrument(skip_all, fields(upload_dir = %upload_dir.display()))]
pub async fn ensure_upload_dir(upload_dir: &Path) -> Result<(), UploadError> {
    fs::create_dir_all(upload_dir)
        .await
        .map_err(|source| UploadError::CreateDirectory {
            path: upload_dir.to_path_buf(),
            source,
        })
}

/// Store each part in arrival order. `upload_dir` must already exist.
///
/// A part whose filename is absent or empty is skipped. The first failing part stops the run:
/// its `Failed` outcome is the last entry in the report.
#[instrument(skip_all, fields(upload_dir = %upload_dir.display(), parts = parts.len()))]
pub async fn store_parts(upload_dir: &Path, parts: Vec<Part>, log: &dyn UploadLog) -> UploadReport {
    let mut report = UploadReport::default();

    for part in parts {
        let outcome = store_part(upload_dir, part, log).await;
        let failed = matches!(outcome, PartOutcome::Failed(_));
        report.outcomes.push(outcome);
        if failed {
            break;
        }
    }

    report
}

async fn store_part(upload_dir: &Path, part: Part, log: &dyn UploadLog) -> PartOutcome {
    let file_name = match filename::extract_file_name(part.content_disposition().as_deref()) {
        Ok(Some(name)) if !name.is_empty() => name,
        Ok(_) => return PartOutcome::Skipped,
        Err(err) => return PartOutcome::Failed(err),
    };

    let path = destination(upload_dir, &file_name);

    match copy_content(part, &path).await {
        Ok(bytes) => {
            let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
            let shown = absolute.display();
            log.info("文件上传成功", &[("path", &shown), ("bytes", &bytes)]);
            PartOutcome::Stored(StoredFile { path, bytes })
        }
        Err(source) => PartOutcome::Failed(UploadError::Write { path, source }),
    }
}

/// `<upload_dir>/<file_name>` by plain concatenation.
///
/// Unlike `Path::join`, an absolute `file_name` does not replace the directory, and `..`
/// components are left for the filesystem to resolve.
pub fn destination(upload_dir: &Path, file_name: &str) -> PathBuf {
    let mut raw = OsString::from(upload_dir.as_os_str());
    raw.push(MAIN_SEPARATOR_STR);
    raw.push(file_name);
    PathBuf::from(raw)
}

/// Copy the whole part to `path`, truncating whatever was there.
async fn copy_content(part: Part, path: &Path) -> io::Result<u64> {
    let mut reader = part.content.into_reader().await?;
    let mut file = fs::File::create(path).await?;
    let bytes = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(bytes)
}
