use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::filter::{EntryMatcher, normalize_path};
use super::request::{ExtractionOutcome, ExtractionRequest};
use crate::error::{Error, Result};
use crate::fs::{FilesystemPort, LocalFs};
use crate::io::ReadAt;
use crate::zip::{ArchiveReader, is_directory_marker};

/// Extract into the real filesystem. Returns `true` iff at least one entry was written.
pub async fn extract<R: ReadAt>(source: Arc<R>, request: &ExtractionRequest) -> Result<bool> {
    extract_with(source, request, &LocalFs)
        .await
        .map(|outcome| outcome.any_extracted())
}

/// Run one extraction pass over `source`, materializing entries through `fs`.
///
/// Entries are visited in central-directory order. The count ceiling ends the
/// pass; the size ceiling only skips the offending entry. Entry data is
/// streamed in chunks of at most [`CHUNK_SIZE`](crate::zip::CHUNK_SIZE)
/// bytes. Files written before an error stay where they are, including a
/// partially written file whose data failed to decode.
///
/// # Errors
///
/// - [`Error::PathTraversal`] if an entry name resolves outside the output root
/// - [`Error::SizeCeilingExceeded`] if requested and oversized entries were the only candidates
/// - [`Error::Cancelled`] if the request's token fires between entries
/// - container, decoding, and filesystem errors as they occur
pub async fn extract_with<R, F>(
    source: Arc<R>,
    request: &ExtractionRequest,
    fs: &F,
) -> Result<ExtractionOutcome>
where
    R: ReadAt,
    F: FilesystemPort + ?Sized,
{
    let mut outcome = ExtractionOutcome::default();

    if source.size() == 0 {
        debug!("source is empty, nothing to extract");
        return Ok(outcome);
    }

    let archive = ArchiveReader::open(source).await?;
    let matcher = EntryMatcher::new(
        &request.path_filters,
        request.extension_filter.as_deref(),
        request.case_sensitive,
    );

    let entries = archive.entries();
    outcome.entries_total = entries.len();

    for (index, entry) in entries.iter().enumerate() {
        if request.is_cancelled() {
            return Err(Error::Cancelled {
                extracted: outcome.extracted_count,
            });
        }

        if let Some(limit) = request
            .max_entry_count
            .filter(|limit| outcome.extracted_count >= *limit)
        {
            warn!(
                total = entries.len(),
                processed = index,
                limit,
                "file count ceiling reached, remaining entries ignored"
            );
            outcome.count_ceiling_hit = true;
            break;
        }
        outcome.entries_processed = index + 1;

        let name = normalize_path(&entry.name, request.case_sensitive);
        let destination = resolve_destination(&request.output_root, &name)?;

        let marker = is_directory_marker(&name);
        let dir = if marker {
            destination.as_path()
        } else {
            destination.parent().unwrap_or(Path::new(""))
        };
        fs.create_dir_all(dir).await?;
        if marker {
            continue;
        }

        if !matcher.matches(&name) {
            trace!(entry = %entry.name, "filtered out");
            continue;
        }

        if let Some(limit) = request.max_entry_size.filter(|limit| entry.length > *limit) {
            warn!(
                entry = %entry.name,
                length = entry.length,
                limit,
                "entry exceeds size ceiling, skipped"
            );
            outcome.size_ceiling_hit = true;
            outcome.oversized_skipped += 1;
            continue;
        }

        let mut data = archive.open_entry(entry).await?;
        let mut file = fs.create_file(&destination).await?;
        while let Some(chunk) = data.next_chunk().await? {
            file.write_chunk(&chunk).await?;
        }
        file.finish().await?;

        let bytes = data.produced();
        outcome.extracted_count += 1;
        outcome.bytes_written += bytes;
        debug!(entry = %entry.name, path = %destination.display(), bytes, "extracted");
    }

    if request.fail_on_size_ceiling && outcome.size_ceiling_hit && outcome.extracted_count == 0 {
        return Err(Error::SizeCeilingExceeded {
            limit: request.max_entry_size.unwrap_or_default(),
            skipped: outcome.oversized_skipped,
        });
    }

    info!(
        extracted = outcome.extracted_count,
        processed = outcome.entries_processed,
        total = outcome.entries_total,
        bytes = outcome.bytes_written,
        "extraction finished"
    );
    Ok(outcome)
}

/// Join `name` onto `root` and make sure the result stays below `root`.
///
/// Resolution is lexical: `.` and `..` are folded without touching the
/// filesystem, and absolute names are rejected. Only directory markers may
/// resolve to `root` itself.
pub fn resolve_destination(root: &Path, name: &str) -> Result<PathBuf> {
    let root = lexical_normalize(root);
    let resolved = lexical_normalize(&root.join(name));

    let escapes = match resolved.strip_prefix(&root) {
        Ok(rest) if rest.as_os_str().is_empty() => !is_directory_marker(name),
        Ok(rest) => rest.components().any(|c| !matches!(c, Component::Normal(_))),
        Err(_) => true,
    };
    if escapes {
        return Err(Error::PathTraversal {
            entry: name.to_string(),
            resolved,
        });
    }
    Ok(resolved)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> &'static Path {
        if cfg!(windows) {
            Path::new("C:/srv/uploads")
        } else {
            Path::new("/srv/uploads")
        }
    }

    #[test]
    fn plain_names_stay_inside() {
        let resolved = resolve_destination(root(), "docs/readme.md").unwrap();
        assert_eq!(resolved, root().join("docs/readme.md"));
    }

    #[test]
    fn inner_parent_segments_are_folded() {
        let resolved = resolve_destination(root(), "docs/../config/./app.json").unwrap();
        assert_eq!(resolved, root().join("config/app.json"));
    }

    #[test]
    fn parent_escape_rejected() {
        let err = resolve_destination(root(), "../../etc/passwd").unwrap_err();
        assert!(matches!(err, Error::PathTraversal { entry, .. } if entry == "../../etc/passwd"));
    }

    #[test]
    fn sibling_with_common_prefix_rejected() {
        assert!(resolve_destination(root(), "../uploads-evil/x").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn absolute_name_rejected() {
        assert!(resolve_destination(root(), "/etc/passwd").is_err());
    }

    #[test]
    fn relative_root() {
        let resolved = resolve_destination(Path::new("./out"), "a/b.txt").unwrap();
        assert_eq!(resolved, Path::new("out/a/b.txt"));
        assert!(resolve_destination(Path::new("out"), "a/../../b.txt").is_err());
        assert!(resolve_destination(Path::new("."), "../b.txt").is_err());
    }

    #[test]
    fn directory_marker_resolves_to_directory() {
        let resolved = resolve_destination(root(), "docs/").unwrap();
        assert_eq!(resolved, root().join("docs"));
        let resolved = resolve_destination(root(), "docs/.").unwrap();
        assert_eq!(resolved, root().join("docs"));
    }

    #[test]
    fn dot_segment_names_may_only_name_root_as_directories() {
        assert_eq!(resolve_destination(root(), "a/..").unwrap(), root());
        assert_eq!(resolve_destination(root(), ".").unwrap(), root());
        assert_eq!(resolve_destination(Path::new("out"), "a/b/../..").unwrap(), Path::new("out"));
    }
}
