//! 폴더 단위 동기화.
//!
//! 폴더의 `.csv`/`.xml` 파일을 이름 순으로 각각 독립적으로 리컨실하고
//! 결과를 합칩니다. 읽을 수 없는 파일은 [`FileFailure`]로 보고하고 건너뜁니다.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use journal_core::NormalizedTrade;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::ImportError,
    format::{Confidence, ImportFormat, SkippedRecord},
    pairing::UnmatchedExecution,
    reconcile::{distinct, Reconciler},
};

const EXTENSIONS: [&str; 2] = ["csv", "xml"];

/// 파일 하나의 리컨실 요약.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub path: PathBuf,
    pub format: ImportFormat,
    pub confidence: Confidence,
    pub trades: usize,
    pub unmatched: usize,
    pub skipped: usize,
}

/// 읽거나 파싱할 수 없었던 파일.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// 폴더 전체 결과.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderReconciliation {
    pub files: Vec<FileSummary>,
    pub failures: Vec<FileFailure>,
    /// 파일 간 중복 ID는 처음 것만 유지
    pub trades: Vec<NormalizedTrade>,
    pub unmatched: Vec<UnmatchedExecution>,
    pub skipped: Vec<SkippedRecord>,
    pub accounts: Vec<String>,
}

fn is_export_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// 폴더의 내보내기 파일을 모두 리컨실합니다.
///
/// # Errors
///
/// 폴더 자체를 읽을 수 없으면 `ImportError::Io`. 개별 파일 문제는
/// `failures`로 보고됩니다.
pub fn reconcile_dir(
    dir: &Path,
    reconciler: &Reconciler,
) -> Result<FolderReconciliation, ImportError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_export_file(path))
        .collect();
    paths.sort();

    info!(dir = %dir.display(), files = paths.len(), "폴더 동기화 시작");

    let mut result = FolderReconciliation::default();
    let mut seen_ids = HashSet::new();

    for path in paths {
        let output = fs::read_to_string(&path)
            .map_err(ImportError::from)
            .and_then(|text| reconciler.reconcile(&text));

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "파일 건너뜀");
                result.failures.push(FileFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };

        debug!(path = %path.display(), format = %output.format, "파일 리컨실 완료");

        result.files.push(FileSummary {
            path,
            format: output.format,
            confidence: output.confidence,
            trades: output.trades.len(),
            unmatched: output.unmatched.len(),
            skipped: output.skipped.len(),
        });
        result.accounts.extend(output.accounts);
        result.trades.extend(
            output
                .trades
                .into_iter()
                .filter(|t| seen_ids.insert(t.id.clone())),
        );
        result.unmatched.extend(output.unmatched);
        result.skipped.extend(output.skipped);
    }

    result.accounts = distinct(result.accounts.iter().map(String::as_str));

    info!(
        files = result.files.len(),
        failures = result.failures.len(),
        trades = result.trades.len(),
        unmatched = result.unmatched.len(),
        "폴더 동기화 완료"
    );

    Ok(result)
}
