use clap::Parser;

use crate::extract::ExtractionRequest;

#[derive(Parser, Debug)]
#[command(name = "zipfence")]
#[command(version)]
#[command(about = "Extract a bounded, filtered subset of a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfence bundle.zip config -e .json -d out      extract JSON files under config/\n  \
  zipfence bundle.zip --max-files 20 --max-file-size 1M\n  \
  curl -s https://example.com/b.zip | zipfence - -d out\n  \
  zipfence -l https://example.com/archive.zip     list files from remote ZIP")]
pub struct Cli {
    /// ZIP file path, HTTP URL, or '-' for stdin
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Path fragments to extract (default: all); an entry matches when either contains the other
    #[arg(value_name = "FILTERS")]
    pub filters: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files into DIR
    #[arg(short = 'd', value_name = "DIR", default_value = ".")]
    pub extract_dir: String,

    /// Only extract entries ending with EXT (e.g. .json)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extension: Option<String>,

    /// Stop after extracting N files
    #[arg(long = "max-files", value_name = "N")]
    pub max_files: Option<usize>,

    /// Skip entries larger than SIZE (bytes, or with K/M/G suffix)
    #[arg(long = "max-file-size", value_name = "SIZE", value_parser = parse_size)]
    pub max_file_size: Option<u64>,

    /// Compare filters and names without lowercasing (written paths keep archive casing)
    #[arg(short = 'c', long = "case-sensitive")]
    pub case_sensitive: bool,

    /// Fail when the size ceiling skipped entries and nothing was extracted
    #[arg(long = "fail-on-size-ceiling")]
    pub fail_on_size_ceiling: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    pub fn is_stdin(&self) -> bool {
        self.source == "-"
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn to_request(&self) -> ExtractionRequest {
        let mut request = ExtractionRequest::new(&self.extract_dir)
            .path_filters(self.filters.iter().cloned())
            .case_sensitive(self.case_sensitive)
            .fail_on_size_ceiling(self.fail_on_size_ceiling);
        request.extension_filter = self.extension.clone();
        request.max_entry_count = self.max_files;
        request.max_entry_size = self.max_file_size;
        request
    }
}

/// Parse a byte count such as `500`, `64K`, `10M` or `2G` (binary units).
pub fn parse_size(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let (digits, multiplier) = match value.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let multiplier = match c.to_ascii_uppercase() {
                'K' => 1u64 << 10,
                'M' => 1 << 20,
                'G' => 1 << 30,
                _ => return Err(format!("unknown size suffix '{c}' in '{value}'")),
            };
            (&value[..i], multiplier)
        }
        _ => (value, 1),
    };

    let number: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{value}'"))?;
    number
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{value}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(parse_size("500"), Ok(500));
        assert_eq!(parse_size("64k"), Ok(64 * 1024));
        assert_eq!(parse_size("10M"), Ok(10 * 1024 * 1024));
        assert_eq!(parse_size("2G"), Ok(2 * 1024 * 1024 * 1024));
        assert!(parse_size("12X").is_err());
        assert!(parse_size("M").is_err());
        assert!(parse_size("-1").is_err());
    }

    #[test]
    fn request_from_args() {
        let cli = Cli::try_parse_from([
            "zipfence",
            "bundle.zip",
            "config",
            "docs/readme.md",
            "-d",
            "out",
            "-e",
            ".json",
            "--max-files",
            "3",
            "--max-file-size",
            "1K",
            "--fail-on-size-ceiling",
        ])
        .unwrap();

        let request = cli.to_request();
        assert_eq!(request.output_root, std::path::PathBuf::from("out"));
        assert_eq!(request.path_filters, vec!["config", "docs/readme.md"]);
        assert_eq!(request.extension_filter.as_deref(), Some(".json"));
        assert_eq!(request.max_entry_count, Some(3));
        assert_eq!(request.max_entry_size, Some(1024));
        assert!(!request.case_sensitive);
        assert!(request.fail_on_size_ceiling);
    }

    #[test]
    fn source_kinds() {
        let remote = Cli::try_parse_from(["zipfence", "https://example.com/a.zip"]).unwrap();
        assert!(remote.is_http_url());
        assert!(!remote.is_stdin());

        let piped = Cli::try_parse_from(["zipfence", "-", "-qq"]).unwrap();
        assert!(piped.is_stdin());
        assert!(piped.is_very_quiet());
        assert_eq!(piped.to_request().output_root, std::path::PathBuf::from("."));
    }
}
