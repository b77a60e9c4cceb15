//! Document text extraction.
//!
//! An [`ExtractorChain`] holds an ordered list of strategies. Each strategy
//! that accepts a path is tried in turn until one yields non-blank text.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::DocumentExtractor;

const TEXT_EXTENSIONS: &[&str] =
    &["txt", "md", "markdown", "csv", "json", "log", "rst", "html", "htm", "xml", "yaml", "yml", "toml"];

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Strict UTF-8 reader for known text formats.
pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn can_extract(&self, path: &Path) -> bool {
        has_extension(path, TEXT_EXTENSIONS)
    }

    fn extract(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::extraction(path, e))
    }
}

// Container and media formats that only decode to noise as text.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "odp", "ods", "epub", "zip", "gz", "tar", "7z",
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp", "mp3", "mp4", "wav", "exe", "dll", "so", "bin",
];

// Above this share of replaced characters the bytes are not text.
const MAX_REPLACEMENT_RATIO: f64 = 0.1;

/// Reads an unknown file as UTF-8, replacing invalid sequences.
///
/// Refuses known binary formats and content that does not look like text.
pub struct LossyTextExtractor;

impl DocumentExtractor for LossyTextExtractor {
    fn name(&self) -> &str {
        "lossy-text"
    }

    fn can_extract(&self, path: &Path) -> bool {
        !has_extension(path, BINARY_EXTENSIONS)
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::extraction(path, e))?;
        if bytes.contains(&0) {
            return Err(Error::extraction(path, "binary content (NUL bytes)"));
        }
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let total = text.chars().count();
        let replaced = text.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
        if total > 0 && replaced as f64 / total as f64 > MAX_REPLACEMENT_RATIO {
            return Err(Error::extraction(path, format!("{replaced} of {total} characters are not valid UTF-8")));
        }
        Ok(text)
    }
}

#[cfg(feature = "pdf")]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl DocumentExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn can_extract(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn extract(&self, path: &Path) -> Result<String> {
        pdf_extract::extract_text(path)
            .map(|text| text.trim().to_string())
            .map_err(|e| Error::extraction(path, e))
    }
}

pub struct ExtractorChain {
    strategies: Vec<Box<dyn DocumentExtractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        let mut strategies: Vec<Box<dyn DocumentExtractor>> = vec![Box::new(PlainTextExtractor)];
        #[cfg(feature = "pdf")]
        strategies.push(Box::new(PdfExtractor));
        strategies.push(Box::new(LossyTextExtractor));
        Self { strategies }
    }
}

impl ExtractorChain {
    pub fn new(strategies: Vec<Box<dyn DocumentExtractor>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Returns the first non-blank text any applicable strategy produces.
    ///
    /// Blank output from every successful strategy yields an empty string.
    /// If no strategy succeeded the error names each failure.
    pub fn extract(&self, path: &Path) -> Result<String> {
        let mut failures = Vec::new();
        let mut saw_blank = false;
        for strategy in self.strategies.iter().filter(|s| s.can_extract(path)) {
            match strategy.extract(path) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(path = %path.display(), strategy = strategy.name(), "extracted text");
                    return Ok(text);
                }
                Ok(_) => {
                    debug!(path = %path.display(), strategy = strategy.name(), "blank output, trying next strategy");
                    saw_blank = true;
                }
                Err(e) => failures.push(format!("{}: {}", strategy.name(), e)),
            }
        }
        if saw_blank {
            return Ok(String::new());
        }
        if failures.is_empty() {
            return Err(Error::extraction(path, "no extraction strategy accepts this file"));
        }
        Err(Error::extraction(path, failures.join("; ")))
    }
}

/// Recursively lists regular files under `root`, sorted by path.
pub fn list_documents(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Failing;

    impl DocumentExtractor for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn can_extract(&self, _path: &Path) -> bool {
            true
        }
        fn extract(&self, path: &Path) -> Result<String> {
            Err(Error::extraction(path, "corrupt"))
        }
    }

    #[test]
    fn plain_text_wins_for_txt() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("notes.txt");
        fs::write(&path, "hello docs").expect("write");
        assert_eq!(ExtractorChain::default().extract(&path).expect("extract"), "hello docs");
    }

    #[test]
    fn invalid_utf8_falls_back_to_lossy() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("broken.txt");
        let mut bytes = b"mostly fine text".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b" with one bad byte!");
        fs::write(&path, bytes).expect("write");
        let text = ExtractorChain::default().extract(&path).expect("extract");
        assert!(text.starts_with("mostly fine text"));
        assert!(text.contains(char::REPLACEMENT_CHARACTER));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn office_container_is_extraction_error() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("report.docx");
        fs::write(&path, b"PK\x03\x04\x14\x00\x06\x00[Content_Types].xml").expect("write");
        let err = ExtractorChain::default().extract(&path).expect_err("docx has no text strategy");
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn binary_content_without_extension_is_rejected() {
        let tmp = TempDir::new().expect("tmp");
        let nul = tmp.path().join("blob");
        fs::write(&nul, b"head\x00\x00tail").expect("write");
        assert!(matches!(ExtractorChain::default().extract(&nul), Err(Error::Extraction { .. })));

        let noise = tmp.path().join("noise.dat");
        fs::write(&noise, [0xff_u8, 0xfe, 0x80, 0x81, b'a', 0x90, 0xc0]).expect("write");
        let err = ExtractorChain::default().extract(&noise).expect_err("mostly invalid utf-8");
        match err {
            Error::Extraction { reason, .. } => assert!(reason.contains("lossy-text"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_extension_with_text_content_is_read() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("README");
        fs::write(&path, "plain words").expect("write");
        assert_eq!(ExtractorChain::default().extract(&path).expect("extract"), "plain words");
    }

    #[test]
    fn failures_are_collected_per_strategy() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("a.bin");
        fs::write(&path, "x").expect("write");
        let chain = ExtractorChain::new(vec![Box::new(Failing), Box::new(Failing)]);
        let err = chain.extract(&path).expect_err("all strategies fail");
        match err {
            Error::Extraction { reason, .. } => assert_eq!(reason.matches("failing: ").count(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_extraction_error() {
        let err = ExtractorChain::default().extract(Path::new("/nonexistent/file.txt")).expect_err("missing");
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn blank_document_extracts_to_empty_text() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("empty.txt");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(ExtractorChain::default().extract(&path).expect("extract"), "");
    }

    #[test]
    fn list_documents_is_recursive_and_sorted() {
        let tmp = TempDir::new().expect("tmp");
        fs::create_dir_all(tmp.path().join("sub")).expect("mkdir");
        fs::write(tmp.path().join("b.txt"), "b").expect("write");
        fs::write(tmp.path().join("sub/a.md"), "a").expect("write");
        fs::write(tmp.path().join("a.txt"), "a").expect("write");
        let files = list_documents(tmp.path());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).expect("prefix").to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "sub/a.md"]);
    }
}
