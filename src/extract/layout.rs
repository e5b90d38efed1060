use std::io::Write;
use std::process::Command;

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::IngestError;
use crate::model::{PageFragments, PositionedFragment};

/// Turns an encrypted document into positioned text fragments per page.
/// The password failure mode must stay distinguishable from a corrupt file.
pub trait DocumentExtractor {
    fn extract(&self, document: &[u8], password: &str)
    -> Result<Vec<PageFragments>, IngestError>;
}

/// Production extractor backed by poppler's pdftotext with bbox output.
pub struct PdftotextExtractor;

impl DocumentExtractor for PdftotextExtractor {
    fn extract(
        &self,
        document: &[u8],
        password: &str,
    ) -> Result<Vec<PageFragments>, IngestError> {
        let mut scratch = NamedTempFile::new()
            .map_err(|err| IngestError::Parse(format!("failed to stage document: {err}")))?;
        scratch
            .write_all(document)
            .and_then(|()| scratch.flush())
            .map_err(|err| IngestError::Parse(format!("failed to stage document: {err}")))?;

        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg("-enc")
            .arg("UTF-8")
            .arg("-upw")
            .arg(password)
            .arg(scratch.path())
            .arg("-")
            .output()
            .map_err(|err| IngestError::Parse(format!("failed to execute pdftotext: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.contains("Incorrect password") {
                return Err(IngestError::Authentication(stderr.to_string()));
            }
            return Err(IngestError::Parse(format!(
                "pdftotext returned non-zero exit status: {stderr}"
            )));
        }

        let body = String::from_utf8_lossy(&output.stdout);
        let pages = parse_bbox_pages(&body)?;
        debug!(pages = pages.len(), "extracted positioned fragments");
        Ok(pages)
    }
}

/// Parses pdftotext bbox XHTML into per-page fragment lists. Whitespace-only
/// runs are dropped and coordinates rounded to integer page units; rounding
/// suppresses sub-pixel jitter that would break same-row grouping.
pub fn parse_bbox_pages(body: &str) -> Result<Vec<PageFragments>, IngestError> {
    let word_pattern = Regex::new(
        r#"<word xMin="([-0-9.]+)" yMin="([-0-9.]+)" xMax="[-0-9.]+" yMax="[-0-9.]+">([^<]*)</word>"#,
    )
    .map_err(|err| IngestError::Parse(format!("failed to compile bbox word pattern: {err}")))?;

    let mut chunks = body.split("<page ");
    // Everything before the first <page element is XHTML preamble.
    chunks.next();

    let mut pages = Vec::new();
    for chunk in chunks {
        let mut fragments = Vec::new();
        for captures in word_pattern.captures_iter(chunk) {
            let text = unescape_xml(&captures[3]);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let x = parse_coordinate(&captures[1])?;
            let y = parse_coordinate(&captures[2])?;
            fragments.push(PositionedFragment {
                text: text.to_string(),
                x,
                y,
            });
        }
        pages.push(fragments);
    }

    if pages.is_empty() {
        return Err(IngestError::Parse(
            "document produced no pages".to_string(),
        ));
    }

    Ok(pages)
}

fn parse_coordinate(raw: &str) -> Result<i32, IngestError> {
    let value = raw
        .parse::<f64>()
        .map_err(|err| IngestError::Parse(format!("invalid bbox coordinate {raw}: {err}")))?;
    Ok(value.round() as i32)
}

fn unescape_xml(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
