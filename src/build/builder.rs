use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{Config, PathsConfig, resolve_path};

use super::assets::{AssetError, copy_assets};
use super::featured::{FeaturedError, load_featured};
use super::markdown::{MarkdownError, MarkdownRenderer};
use super::paths::slug_to_output_path;
use super::render::{RenderError, Renderer, SiteTemplates};
use super::source::{SourceError, StudySource};
use super::study::{Study, StudyError, StudyProcessor};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("featured error: {0}")]
    Featured(#[from] FeaturedError),

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("refusing to clean output directory {}: it contains the project or its inputs", .0.display())]
    UnsafeOutputDir(PathBuf),

    #[error("failed to reset output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A study that could not be turned into a page.
#[derive(Debug)]
pub struct FailedStudy {
    pub path: PathBuf,
    pub error: String,
}

pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Slugs of the generated study pages, in processing order
    pub studies: Vec<String>,
    pub failed: Vec<FailedStudy>,
    pub assets: usize,
}

pub struct Builder {
    config: Config,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
}

impl Builder {
    pub fn new(config: Config, base_path: PathBuf) -> Self {
        Self { config, base_path }
    }

    /// Input locations resolved against the base path.
    pub fn paths(&self) -> PathsConfig {
        self.config.paths.resolve(&self.base_path)
    }

    /// Output directory, resolved against the base path.
    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.base_path, &self.config.site.output)
    }

    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let paths = self.paths();
        let output_dir = self.output_dir();

        // Configuration problems abort before anything is deleted
        let markdown = MarkdownRenderer::new(&self.config.markdown)?;
        let source = StudySource::resolve(paths.studies.clone())?;
        log!("build"; "building {}", self.config.site.name);

        // Step 1: Clean
        self.reset_output_dir(&output_dir).await?;

        // Step 2: Load templates
        let templates = SiteTemplates::load(&paths.templates).await?;
        for problem in templates.placeholder_problems() {
            log!("build"; "warning: {}", problem);
        }
        let renderer = Renderer::new(
            templates,
            &self.config.site.date_format,
            self.config.labels.clone(),
        )?;

        // Step 3: Discover
        let files = source.discover()?;
        if files.is_empty() {
            log!("build"; "warning: no markdown files found in {}", source.root.display());
        } else {
            log!("build"; "found {} markdown file(s)", files.len());
        }

        // Step 4: Process and write each study
        let processor = StudyProcessor::new(&source, &markdown, &renderer);
        let mut studies: Vec<Study> = Vec::new();
        let mut failed: Vec<FailedStudy> = Vec::new();
        let mut slugs: HashMap<String, PathBuf> = HashMap::new();

        for path in &files {
            match self
                .write_study(path, &processor, &renderer, &output_dir, &slugs)
                .await
            {
                Ok(study) => {
                    log!("study"; "✓ {}.html", study.slug());
                    slugs.insert(study.slug().to_string(), study.source_path.clone());
                    studies.push(study);
                }
                Err(e) => {
                    log_error!("study"; "✗ {}: {}", source.relative_path(path).display(), e);
                    failed.push(FailedStudy {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Step 5: Compose the index
        let featured = load_featured(&paths.featured).await?;
        let index_html = renderer.render_index_page(&studies, &featured)?;
        tokio::fs::write(output_dir.join("index.html"), index_html).await?;
        log!("index"; "✓ index.html ({} studies, {} featured entries)", studies.len(), featured.len());

        // Step 6: Copy assets
        let assets = copy_assets(&paths.assets, &output_dir.join("assets")).await?;
        if assets > 0 {
            log!("assets"; "copied {} file(s)", assets);
        }

        let display_output = output_dir.canonicalize().unwrap_or(output_dir.clone());
        log!("build"; "wrote {} page(s) to {}", studies.len() + 1, display_output.display());
        if !failed.is_empty() {
            log_error!("build"; "{} file(s) failed", failed.len());
        }

        Ok(BuildResult {
            output_dir,
            studies: studies.iter().map(|s| s.slug().to_string()).collect(),
            failed,
            assets,
        })
    }

    /// Process one file and write its page. Every error here is recoverable.
    async fn write_study(
        &self,
        path: &Path,
        processor: &StudyProcessor<'_>,
        renderer: &Renderer,
        output_dir: &Path,
        slugs: &HashMap<String, PathBuf>,
    ) -> Result<Study, WriteStudyError> {
        let study = processor.load(path).await?;

        if let Some(existing) = slugs.get(study.slug()) {
            return Err(StudyError::DuplicateSlug {
                slug: study.slug().to_string(),
                path: path.to_path_buf(),
                existing: existing.clone(),
            }
            .into());
        }

        let html = renderer.render_study_page(&study)?;
        let output_path = slug_to_output_path(study.slug(), output_dir);
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&output_path, html).await?;

        Ok(study)
    }

    /// Fail if deleting the output directory would take the project or any
    /// of its inputs with it.
    pub fn check_output_dir(&self) -> Result<(), BuildError> {
        let output_dir = self.output_dir();
        let output = normalize(&output_dir);
        let paths = self.paths();
        let protected = [
            &self.base_path,
            &paths.studies,
            &paths.templates,
            &paths.featured,
            &paths.assets,
        ];
        if protected
            .iter()
            .any(|path| normalize(path).starts_with(&output))
        {
            return Err(BuildError::UnsafeOutputDir(output_dir));
        }
        Ok(())
    }

    /// Remove and recreate the output directory.
    async fn reset_output_dir(&self, output_dir: &Path) -> Result<(), BuildError> {
        self.check_output_dir()?;

        let output_error = |source| BuildError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        };
        if tokio::fs::try_exists(output_dir).await.map_err(output_error)? {
            tokio::fs::remove_dir_all(output_dir)
                .await
                .map_err(output_error)?;
            log!("clean"; "removed {}", output_dir.display());
        }
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(output_error)?;
        Ok(())
    }
}

/// Per-file failure while producing a study page.
#[derive(thiserror::Error, Debug)]
enum WriteStudyError {
    #[error(transparent)]
    Study(#[from] StudyError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write page: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical form of a path if it exists, the path itself otherwise.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDY_TEMPLATE: &str = "<html><head><title>{{TITLE}}</title><meta name=\"description\" content=\"{{DESCRIPTION}}\"></head><body>{{CONTENT}}</body></html>";
    const INDEX_TEMPLATE: &str = "<html><body><div id=\"featured\">{{FEATURED_SECTION}}</div><ul id=\"all\">{{ALL_STUDIES}}</ul></body></html>";

    struct Project {
        dir: tempfile::TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let templates = dir.path().join("src/templates");
            std::fs::create_dir_all(&templates).unwrap();
            std::fs::create_dir_all(dir.path().join("src/studies")).unwrap();
            std::fs::write(templates.join("study.html"), STUDY_TEMPLATE).unwrap();
            std::fs::write(templates.join("index.html"), INDEX_TEMPLATE).unwrap();
            Self { dir }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn study(&self, relative: &str, title: &str, date: &str, body: &str) {
            let content = format!(
                "---\ntitle: {title}\nbanner: /assets/banner.png\ndate: {date}\ntags: [notes]\n---\n{body}"
            );
            self.write(&format!("src/studies/{relative}"), &content);
        }

        fn write(&self, relative: &str, content: &str) {
            let path = self.root().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn builder(&self) -> Builder {
            Builder::new(Config::default(), self.root().to_path_buf())
        }

        fn output(&self, relative: &str) -> String {
            std::fs::read_to_string(self.root().join("build").join(relative)).unwrap()
        }
    }

    #[tokio::test]
    async fn test_build_writes_pages_and_index() {
        let project = Project::new();
        project.study("algorithms/sorting/quicksort.md", "Quicksort", "2024-03-01", "# Idea\n\nSee [heaps](../heap.md).\n");
        project.study("intro.md", "Intro", "2024-01-01", "Hello\n");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["algorithms/sorting/quicksort", "intro"]);
        assert!(result.failed.is_empty());

        let page = project.output("algorithms/sorting/quicksort.html");
        assert!(page.contains("<title>Quicksort</title>"));
        assert!(page.contains("content=\"Estudo sobre Quicksort\""));
        assert!(page.contains("<nav class=\"toc\">"));
        assert!(page.contains("href=\"../heap.html\""));
        assert!(page.contains("📅 01/03/2024"));

        let index = project.output("index.html");
        assert!(index.contains("<a href=\"/algorithms/sorting/quicksort.html\">"));
        assert!(index.contains("<a href=\"/intro.html\">"));
    }

    #[tokio::test]
    async fn test_invalid_documents_are_excluded() {
        let project = Project::new();
        project.study("good.md", "Good", "2024-01-01", "ok\n");
        project.write("src/studies/no-banner.md", "---\ntitle: Missing\ndate: 2024-01-01\n---\nBody\n");
        project.write("src/studies/bad-yaml.md", "---\ntitle: [unclosed\n---\nBody\n");
        project.study("bad-date.md", "Bad date", "yesterday", "x\n");
        project.write("src/studies/notes.txt", "not markdown");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["good"]);
        assert_eq!(result.failed.len(), 3);
        assert!(!project.root().join("build/no-banner.html").exists());
        assert!(!project.root().join("build/notes.html").exists());
        assert!(!project.output("index.html").contains("Missing"));
    }

    #[tokio::test]
    async fn test_index_is_sorted_by_date_descending() {
        let project = Project::new();
        project.study("a.md", "January", "2024-01-01", "");
        project.study("b.md", "March", "2024-03-01", "");
        project.study("c.md", "February", "2024-02-01", "");

        project.builder().build().await.unwrap();

        let index = project.output("index.html");
        let march = index.find("March").unwrap();
        let february = index.find("February").unwrap();
        let january = index.find("January").unwrap();
        assert!(march < february && february < january);
    }

    #[tokio::test]
    async fn test_featured_entries_resolve_by_slug() {
        let project = Project::new();
        project.study("trees/bst.md", "Binary Search Trees", "2024-01-01", "");
        project.write(
            "src/featured-studies.json",
            r#"[{"slug": "trees/bst", "reason": "Start here"}, {"slug": "ghost", "reason": "Nowhere"}]"#,
        );

        let result = project.builder().build().await.unwrap();
        assert!(result.failed.is_empty());

        let index = project.output("index.html");
        assert!(index.contains("<a href=\"/trees/bst.html\" class=\"study-card\">"));
        assert!(index.contains("Start here"));
        assert!(!index.contains("Nowhere"));
    }

    #[tokio::test]
    async fn test_malformed_featured_manifest_is_fatal() {
        let project = Project::new();
        project.write("src/featured-studies.json", "{ not json");

        let result = project.builder().build().await;
        assert!(matches!(result, Err(BuildError::Featured(_))));
    }

    #[tokio::test]
    async fn test_missing_template_is_fatal() {
        let project = Project::new();
        std::fs::remove_file(project.root().join("src/templates/index.html")).unwrap();

        let result = project.builder().build().await;
        assert!(matches!(
            result,
            Err(BuildError::Render(RenderError::TemplateNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_studies_root_is_fatal() {
        let project = Project::new();
        std::fs::remove_dir_all(project.root().join("src/studies")).unwrap();

        let result = project.builder().build().await;
        assert!(matches!(
            result,
            Err(BuildError::Source(SourceError::PathNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_empty_studies_root_still_writes_index() {
        let project = Project::new();

        let result = project.builder().build().await.unwrap();

        assert!(result.studies.is_empty());
        let index = project.output("index.html");
        assert!(index.contains("<div id=\"featured\"></div><ul id=\"all\"></ul>"));
    }

    #[tokio::test]
    async fn test_builds_are_byte_identical() {
        let project = Project::new();
        project.study("one.md", "One", "2024-01-01", "# A\n\n## B\n");
        project.study("nested/two.md", "Two", "2024-01-01", "text\n");
        let builder = project.builder();

        builder.build().await.unwrap();
        let first = (project.output("index.html"), project.output("one.html"), project.output("nested/two.html"));
        builder.build().await.unwrap();
        let second = (project.output("index.html"), project.output("one.html"), project.output("nested/two.html"));

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_output_directory_is_reset() {
        let project = Project::new();
        project.write("build/stale.html", "old");

        project.builder().build().await.unwrap();

        assert!(!project.root().join("build/stale.html").exists());
        assert!(project.root().join("build/index.html").exists());
    }

    #[tokio::test]
    async fn test_refuses_to_clean_project_root() {
        let project = Project::new();
        let mut config = Config::default();
        config.site.output = PathBuf::from(".");

        let result = Builder::new(config, project.root().to_path_buf()).build().await;

        assert!(matches!(result, Err(BuildError::UnsafeOutputDir(_))));
        assert!(project.root().join("src/templates/study.html").exists());
    }

    #[tokio::test]
    async fn test_refuses_to_clean_studies_parent() {
        let project = Project::new();
        let mut config = Config::default();
        config.site.output = PathBuf::from("src");

        let result = Builder::new(config, project.root().to_path_buf()).build().await;

        assert!(matches!(result, Err(BuildError::UnsafeOutputDir(_))));
        assert!(project.root().join("src/studies").exists());
    }

    #[tokio::test]
    async fn test_reserved_slugs_fail_without_clobbering_site_pages() {
        let project = Project::new();
        project.study("index.md", "Home notes", "2024-01-01", "");
        project.study("assets/style.md", "Style notes", "2024-01-01", "");
        project.study("ok.md", "Fine", "2024-01-01", "");
        project.write("src/assets/style.css", "body {}");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["ok"]);
        assert_eq!(result.failed.len(), 2);
        let index = project.output("index.html");
        assert!(index.starts_with("<html><body><div id=\"featured\">"));
        assert!(!index.contains("Home notes"));
        assert!(!index.contains("Style notes"));
        assert!(!project.root().join("build/assets/style.html").exists());
    }

    #[tokio::test]
    async fn test_unwritable_page_is_failed_and_left_out_of_index() {
        let project = Project::new();
        // `notes.html/` is created as a directory for the nested study, so
        // `notes.md` cannot be written to `notes.html`
        project.study("notes.html/inner.md", "Inner", "2024-01-02", "");
        project.study("notes.md", "Lost notes", "2024-01-01", "");
        project.study("other.md", "Other", "2024-01-03", "");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["notes.html/inner", "other"]);
        assert_eq!(result.failed.len(), 1);
        assert!(result.failed[0].path.ends_with("notes.md"));
        assert!(result.failed[0].error.contains("failed to write page"));

        let index = project.output("index.html");
        assert!(index.contains("<a href=\"/notes.html/inner.html\">"));
        assert!(index.contains("<a href=\"/other.html\">"));
        assert!(!index.contains("Lost notes"));
        assert!(!index.contains("<a href=\"/notes.html\">"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_study_is_built() {
        let project = Project::new();
        project.write(
            "elsewhere/shared.md",
            "---\ntitle: Shared\nbanner: b.png\ndate: 2024-01-01\n---\nBody\n",
        );
        std::os::unix::fs::symlink(
            project.root().join("elsewhere/shared.md"),
            project.root().join("src/studies/linked.md"),
        )
        .unwrap();

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["linked"]);
        assert!(project.output("linked.html").contains("<title>Shared</title>"));
    }

    #[test]
    fn test_check_output_dir_protects_inputs() {
        let project = Project::new();
        for output in [".", "src", "src/templates"] {
            let mut config = Config::default();
            config.site.output = PathBuf::from(output);
            let builder = Builder::new(config, project.root().to_path_buf());
            assert!(
                matches!(builder.check_output_dir(), Err(BuildError::UnsafeOutputDir(_))),
                "{output}"
            );
        }
        assert!(project.builder().check_output_dir().is_ok());
    }

    #[tokio::test]
    async fn test_assets_are_copied() {
        let project = Project::new();
        project.write("src/assets/css/site.css", "body {}");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.assets, 1);
        assert_eq!(project.output("assets/css/site.css"), "body {}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_duplicate_slug_keeps_first() {
        let project = Project::new();
        project.study("a/b.md", "Nested", "2024-01-01", "");
        // A backslash in a file name maps onto the same slug as the nested file
        project.study("a\\b.md", "Flat", "2024-01-02", "");

        let result = project.builder().build().await.unwrap();

        assert_eq!(result.studies, vec!["a/b"]);
        assert_eq!(result.failed.len(), 1);
        assert!(result.failed[0].error.contains("already used"));
        assert!(project.output("a/b.html").contains("<title>Nested</title>"));
    }

    #[tokio::test]
    async fn test_unknown_markdown_extension_is_fatal() {
        let project = Project::new();
        let mut config = Config::default();
        config.markdown.extensions.push("emoji".to_string());

        let result = Builder::new(config, project.root().to_path_buf()).build().await;
        assert!(matches!(result, Err(BuildError::Markdown(_))));
    }
}
