use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Configuration for one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub output_root: PathBuf,
    /// Empty means every entry passes the path dimension.
    pub path_filters: Vec<String>,
    pub extension_filter: Option<String>,
    pub max_entry_count: Option<usize>,
    pub max_entry_size: Option<u64>,
    pub case_sensitive: bool,
    pub fail_on_size_ceiling: bool,
    pub cancellation: Option<CancellationToken>,
}

impl ExtractionRequest {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    pub fn path_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension_filter = Some(extension.into());
        self
    }

    pub fn max_entry_count(mut self, count: usize) -> Self {
        self.max_entry_count = Some(count);
        self
    }

    pub fn max_entry_size(mut self, bytes: u64) -> Self {
        self.max_entry_size = Some(bytes);
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn fail_on_size_ceiling(mut self, yes: bool) -> Self {
        self.fail_on_size_ceiling = yes;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// What a finished pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub extracted_count: usize,
    pub size_ceiling_hit: bool,
    /// Entries skipped because they exceeded the size ceiling.
    pub oversized_skipped: usize,
    pub count_ceiling_hit: bool,
    pub entries_total: usize,
    /// Entries looked at before the pass ended.
    pub entries_processed: usize,
    pub bytes_written: u64,
}

impl ExtractionOutcome {
    pub fn any_extracted(&self) -> bool {
        self.extracted_count > 0
    }
}
