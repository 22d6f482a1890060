//! Turning one markdown file into a [`Study`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::{Captures, Regex};

use super::document::{FrontMatterError, parse_front_matter};
use super::markdown::MarkdownRenderer;
use super::paths::is_reserved_slug;
use super::render::{RenderError, Renderer};
use super::source::StudySource;
use super::toc::extract_headings;

/// Front matter fields every study must define.
pub const REQUIRED_FIELDS: [&str; 3] = ["title", "banner", "date"];

/// Matches `href` attributes pointing at a markdown file, with an optional fragment.
static MARKDOWN_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="([^"]+?)\.md(#[^"]*)?""#).expect("markdown href pattern is valid")
});

/// Matches a URL scheme such as `https:` or `mailto:`.
static URL_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern is valid")
});

#[derive(thiserror::Error, Debug)]
pub enum StudyError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error(
        "incomplete front matter in {}: missing {} (required: title, banner, date)",
        .path.display(),
        .fields.join(", ")
    )]
    MissingFields {
        path: PathBuf,
        fields: Vec<&'static str>,
    },

    #[error(
        "invalid date '{value}' in {}: expected YYYY-MM-DD or an RFC 3339 timestamp",
        .path.display()
    )]
    InvalidDate { path: PathBuf, value: String },

    #[error("slug '{slug}' of {} is already used by {}", .path.display(), .existing.display())]
    DuplicateSlug {
        slug: String,
        path: PathBuf,
        existing: PathBuf,
    },

    #[error("slug '{slug}' of {} collides with a generated output path", .path.display())]
    ReservedSlug { slug: String, path: PathBuf },

    #[error("failed to render table of contents for {}: {source}", .path.display())]
    Toc {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// Validated front matter plus the slug derived from the file location.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyMetadata {
    pub title: String,
    pub banner: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
    /// Path relative to the studies root, without extension, `/`-separated
    pub slug: String,
}

/// A fully processed study, held in memory for the duration of a build.
#[derive(Debug, Clone)]
pub struct Study {
    pub metadata: StudyMetadata,
    /// Rendered body with `.md` links rewritten to `.html`
    pub html_content: String,
    /// Markdown body without front matter
    pub raw_content: String,
    /// Table of contents fragment, empty when the body has no headings
    pub toc: String,
    pub source_path: PathBuf,
}

impl Study {
    pub fn slug(&self) -> &str {
        &self.metadata.slug
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}

/// Converts markdown files into studies.
pub struct StudyProcessor<'a> {
    source: &'a StudySource,
    markdown: &'a MarkdownRenderer,
    renderer: &'a Renderer,
}

impl<'a> StudyProcessor<'a> {
    pub fn new(source: &'a StudySource, markdown: &'a MarkdownRenderer, renderer: &'a Renderer) -> Self {
        Self {
            source,
            markdown,
            renderer,
        }
    }

    /// Read and process one file.
    pub async fn load(&self, path: &Path) -> Result<Study, StudyError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StudyError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        self.process(path, &content)
    }

    /// Process the content of the file at `path`.
    pub fn process(&self, path: &Path, file_content: &str) -> Result<Study, StudyError> {
        let slug = self.source.slug_for(path);
        if is_reserved_slug(&slug) {
            return Err(StudyError::ReservedSlug {
                slug,
                path: path.to_path_buf(),
            });
        }

        let parsed = parse_front_matter(file_content).map_err(|e| StudyError::FrontMatter {
            path: path.to_path_buf(),
            source: e,
        })?;
        let front_matter = parsed.front_matter;

        let (Some(title), Some(banner), Some(raw_date)) = (
            front_matter.string("title"),
            front_matter.string("banner"),
            front_matter.string("date"),
        ) else {
            return Err(StudyError::MissingFields {
                path: path.to_path_buf(),
                fields: REQUIRED_FIELDS
                    .into_iter()
                    .filter(|field| front_matter.string(field).is_none())
                    .collect(),
            });
        };

        let date = parse_date(&raw_date).ok_or_else(|| StudyError::InvalidDate {
            path: path.to_path_buf(),
            value: raw_date.clone(),
        })?;

        let html_content = rewrite_markdown_links(&self.markdown.render(&parsed.content));
        let toc = self
            .renderer
            .render_toc(&extract_headings(&html_content))
            .map_err(|e| StudyError::Toc {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Study {
            metadata: StudyMetadata {
                title,
                banner,
                date,
                tags: front_matter.string_list("tags"),
                slug,
            },
            html_content,
            raw_content: parsed.content,
            toc,
            source_path: path.to_path_buf(),
        })
    }
}

/// Parse a front matter date: `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Point same-site links at generated pages: `href="a/b.md#x"` -> `href="a/b.html#x"`.
///
/// Links with a URL scheme or protocol-relative links are left alone.
pub fn rewrite_markdown_links(html: &str) -> String {
    MARKDOWN_HREF_RE
        .replace_all(html, |caps: &Captures| {
            let target = &caps[1];
            if target.starts_with("//") || URL_SCHEME_RE.is_match(target) {
                return caps[0].to_string();
            }
            let fragment = caps.get(2).map_or("", |m| m.as_str());
            format!("href=\"{}.html{}\"", target, fragment)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::render::SiteTemplates;
    use crate::config::{LabelsConfig, MarkdownConfig};

    fn with_processor(test: impl FnOnce(&StudyProcessor, &Path)) {
        let dir = tempfile::tempdir().unwrap();
        let source = StudySource::resolve(dir.path().to_path_buf()).unwrap();
        let markdown = MarkdownRenderer::new(&MarkdownConfig::default()).unwrap();
        let templates = SiteTemplates {
            study: String::new(),
            index: String::new(),
        };
        let labels = LabelsConfig {
            toc_title: "Contents".to_string(),
            ..LabelsConfig::default()
        };
        let renderer = Renderer::new(templates, "%d/%m/%Y", labels).unwrap();
        let processor = StudyProcessor::new(&source, &markdown, &renderer);
        test(&processor, dir.path());
    }

    const VALID: &str = "---\ntitle: Quicksort\nbanner: /assets/qs.png\ndate: 2024-03-01\ntags: [sorting, divide-and-conquer]\n---\n\n# Overview\n\nSee [heaps](../trees/heap.md).\n\n## Partition\n";

    #[test]
    fn test_process_valid_study() {
        with_processor(|processor, root| {
            let path = root.join("algorithms/sorting/quicksort.md");
            let study = processor.process(&path, VALID).unwrap();

            assert_eq!(study.metadata.title, "Quicksort");
            assert_eq!(study.metadata.banner, "/assets/qs.png");
            assert_eq!(study.metadata.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            assert_eq!(study.metadata.tags, vec!["sorting", "divide-and-conquer"]);
            assert_eq!(study.slug(), "algorithms/sorting/quicksort");
            assert!(study.raw_content.starts_with("# Overview"));
            assert!(study.html_content.contains("href=\"../trees/heap.html\""));
            assert!(study.toc.contains("toc-level-1\"><a href=\"#overview\">Overview</a>"));
            assert!(study.toc.contains("toc-level-2\"><a href=\"#partition\">Partition</a>"));
        });
    }

    #[test]
    fn test_missing_fields_are_reported() {
        with_processor(|processor, root| {
            let path = root.join("broken.md");
            let err = processor
                .process(&path, "---\ntitle: Broken\n---\nBody")
                .unwrap_err();
            match err {
                StudyError::MissingFields { fields, .. } => assert_eq!(fields, vec!["banner", "date"]),
                other => panic!("unexpected error: {other}"),
            }
        });
    }

    #[test]
    fn test_no_front_matter_is_missing_everything() {
        with_processor(|processor, root| {
            let err = processor.process(&root.join("plain.md"), "# Plain").unwrap_err();
            assert!(err.to_string().contains("missing title, banner, date"));
        });
    }

    #[test]
    fn test_invalid_date() {
        with_processor(|processor, root| {
            let content = "---\ntitle: T\nbanner: b.png\ndate: someday\n---\n";
            let err = processor.process(&root.join("t.md"), content).unwrap_err();
            assert!(matches!(err, StudyError::InvalidDate { ref value, .. } if value == "someday"));
        });
    }

    #[test]
    fn test_tags_default_to_empty() {
        with_processor(|processor, root| {
            let content = "---\ntitle: T\nbanner: b.png\ndate: 2024-01-01\n---\nNo headings here.";
            let study = processor.process(&root.join("t.md"), content).unwrap();
            assert!(study.metadata.tags.is_empty());
            assert_eq!(study.toc, "");
        });
    }

    #[test]
    fn test_reserved_slugs_are_rejected() {
        with_processor(|processor, root| {
            for relative in ["index.md", "assets/notes.md"] {
                let err = processor.process(&root.join(relative), VALID).unwrap_err();
                assert!(
                    matches!(err, StudyError::ReservedSlug { .. }),
                    "{relative}: {err}"
                );
            }
            assert!(processor.process(&root.join("guides/index.md"), VALID).is_ok());
        });
    }

    #[test]
    fn test_invalid_date_message_names_both_formats() {
        with_processor(|processor, root| {
            let content = "---\ntitle: T\nbanner: b.png\ndate: 2024/01/01\n---\n";
            let err = processor.process(&root.join("t.md"), content).unwrap_err();
            let message = err.to_string();
            assert!(message.contains("YYYY-MM-DD"));
            assert!(message.contains("RFC 3339"));
        });
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(
            parse_date("2024-05-06T10:00:00-03:00"),
            NaiveDate::from_ymd_opt(2024, 5, 6)
        );
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("01/02/2024"), None);
    }

    #[test]
    fn test_rewrite_markdown_links() {
        assert_eq!(rewrite_markdown_links(r#"<a href="foo.md">"#), r#"<a href="foo.html">"#);
        assert_eq!(
            rewrite_markdown_links(r#"<a href="../a/b.md#part">"#),
            r#"<a href="../a/b.html#part">"#
        );
        assert_eq!(rewrite_markdown_links(r#"<a href="foo.html">"#), r#"<a href="foo.html">"#);
        assert_eq!(rewrite_markdown_links(r##"<a href="#intro">"##), r##"<a href="#intro">"##);
        assert_eq!(rewrite_markdown_links(r#"<a href="notes.mdx">"#), r#"<a href="notes.mdx">"#);
    }

    #[test]
    fn test_external_markdown_links_are_untouched() {
        let html = r#"<a href="https://github.com/x/README.md">"#;
        assert_eq!(rewrite_markdown_links(html), html);
        let html = r#"<a href="//cdn.example.com/a.md">"#;
        assert_eq!(rewrite_markdown_links(html), html);
    }
}
