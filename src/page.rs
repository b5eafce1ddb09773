//! Page-context collaborator.
//!
//! Supplies the plain-text extraction of "the page being viewed". The core
//! treats it as an opaque string: no size limits, no sanitization — that is
//! the extractor's job, not ours.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Bundled demo article, standing in for a live page extraction when no
/// page file is supplied.
const DEMO_ARTICLE: &str = "\
The Multi-Model Era: Why Sidebar AI is the New OS.

Building a \"Sider-like\" extension (a universal AI sidebar) is a massive \
step up in complexity because you are no longer just manipulating the page; \
you are building a unified bridge between the browser's data and dozens of \
external AI brains.

Layer 1: The Context Scraper
The Job: Instead of just sending a URL, it extracts the Semantic Core of \
the tab. Problem it solves: Sending a 20MB HTML file to an AI is expensive \
and slow. How: Use Readability.js to strip junk and only send the core \
article text to the AI.

\"We don't want the user to wait 30 seconds for a full answer; you need the \
text to 'drip' into the UI as it's generated.\"

The BYOK Revolution
Sider and other clones are expensive because they charge you a markup on \
the AI usage. The \"Real World\" Gap: There is no high-quality, Open Source \
sidebar that lets users input their own API keys from local payment systems \
like Safaricom M-Pesa.

Problem: Privacy. Sider sees every prompt you send. Solution: Build a \
\"Zero-Knowledge Sidebar\" where keys are stored only in local encrypted \
storage and never touch your servers.";

/// Load page context from a file, or fall back to the demo article.
pub fn load(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read page file {}", path.display())),
        None => Ok(DEMO_ARTICLE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn falls_back_to_demo_article() {
        let text = load(None).unwrap();
        assert!(text.contains("Semantic Core"));
    }

    #[test]
    fn reads_page_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Article about AI.").unwrap();
        let text = load(Some(file.path())).unwrap();
        assert_eq!(text, "Article about AI.");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/page.txt"))).is_err());
    }
}
