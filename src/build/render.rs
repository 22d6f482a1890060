use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::Serialize;
use tera::{Context, Tera};

use super::featured::FeaturedStudy;
use super::paths::slug_to_url;
use super::study::Study;
use super::toc::Heading;
use crate::config::LabelsConfig;
use crate::util::html_escape;

pub const TITLE_PLACEHOLDER: &str = "{{TITLE}}";
pub const DESCRIPTION_PLACEHOLDER: &str = "{{DESCRIPTION}}";
pub const CONTENT_PLACEHOLDER: &str = "{{CONTENT}}";
pub const FEATURED_PLACEHOLDER: &str = "{{FEATURED_SECTION}}";
pub const ALL_STUDIES_PLACEHOLDER: &str = "{{ALL_STUDIES}}";

const STUDY_TEMPLATE_FILE: &str = "study.html";
const INDEX_TEMPLATE_FILE: &str = "index.html";

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to load template {}: {source}", .path.display())]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),
}

/// The two page templates, loaded from the templates directory.
///
/// Templates are plain HTML with literal placeholder tokens; see
/// [`fill_placeholders`].
#[derive(Debug, Clone)]
pub struct SiteTemplates {
    pub study: String,
    pub index: String,
}

impl SiteTemplates {
    /// Load `study.html` and `index.html` from the given directory.
    pub async fn load(templates_dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            study: read_template(&templates_dir.join(STUDY_TEMPLATE_FILE)).await?,
            index: read_template(&templates_dir.join(INDEX_TEMPLATE_FILE)).await?,
        })
    }

    /// Placeholders that are absent from, or repeated in, their template.
    ///
    /// Only the first occurrence of a placeholder is replaced, so either case
    /// means the generated page will not look as intended.
    pub fn placeholder_problems(&self) -> Vec<String> {
        let checks = [
            (STUDY_TEMPLATE_FILE, &self.study, TITLE_PLACEHOLDER),
            (STUDY_TEMPLATE_FILE, &self.study, DESCRIPTION_PLACEHOLDER),
            (STUDY_TEMPLATE_FILE, &self.study, CONTENT_PLACEHOLDER),
            (INDEX_TEMPLATE_FILE, &self.index, FEATURED_PLACEHOLDER),
            (INDEX_TEMPLATE_FILE, &self.index, ALL_STUDIES_PLACEHOLDER),
        ];

        checks
            .into_iter()
            .filter_map(|(file, template, placeholder)| match template.matches(placeholder).count() {
                0 => Some(format!("{file} has no {placeholder} placeholder")),
                1 => None,
                n => Some(format!(
                    "{file} contains {placeholder} {n} times; only the first is replaced"
                )),
            })
            .collect()
    }
}

async fn read_template(path: &Path) -> Result<String, RenderError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RenderError::TemplateNotFound {
            path: path.to_path_buf(),
            source,
        })
}

/// Replace the first occurrence of each placeholder in a single pass.
///
/// Substituted values are never scanned for placeholders, so content that
/// happens to contain `{{TITLE}}` is left as written.
pub fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut spans: Vec<(usize, usize, &str)> = values
        .iter()
        .filter_map(|(placeholder, value)| {
            template
                .find(placeholder)
                .map(|start| (start, start + placeholder.len(), *value))
        })
        .collect();
    spans.sort_by_key(|(start, _, _)| *start);

    let mut output = String::with_capacity(template.len());
    let mut cursor = 0;
    for (start, end, value) in spans {
        if start < cursor {
            continue;
        }
        output.push_str(&template[cursor..start]);
        output.push_str(value);
        cursor = end;
    }
    output.push_str(&template[cursor..]);
    output
}

/// Study fields as seen by the fragment templates.
#[derive(Debug, Serialize)]
struct StudyView<'a> {
    title: &'a str,
    banner: &'a str,
    /// Formatted with the site date format
    date: String,
    tags: &'a [String],
    url: String,
}

#[derive(Debug, Serialize)]
struct FeaturedCard<'a> {
    study: StudyView<'a>,
    reason: &'a str,
}

/// Composes study pages and the index page.
///
/// Page chrome comes from the user's [`SiteTemplates`]; the fragments that go
/// into the placeholders are rendered by built-in Tera partials.
pub struct Renderer {
    tera: Tera,
    templates: SiteTemplates,
    date_format: String,
    labels: LabelsConfig,
}

impl Renderer {
    pub fn new(
        templates: SiteTemplates,
        date_format: &str,
        labels: LabelsConfig,
    ) -> Result<Self, RenderError> {
        if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
            return Err(RenderError::InvalidDateFormat(date_format.to_string()));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("study_body.html", include_str!("partials/study_body.html")),
            ("featured.html", include_str!("partials/featured.html")),
            ("study_list.html", include_str!("partials/study_list.html")),
            ("toc.html", include_str!("partials/toc.html")),
        ])?;
        // Values are escaped explicitly with the `html` filter; content and TOC are raw HTML
        tera.autoescape_on(vec![]);
        tera.register_filter("html", html_filter);

        Ok(Self {
            tera,
            templates,
            date_format: date_format.to_string(),
            labels,
        })
    }

    /// Render the table of contents for a study body.
    ///
    /// Nesting is expressed through `toc-level-N` classes rather than nested
    /// lists. Returns an empty string when there are no headings.
    pub fn render_toc(&self, headings: &[Heading]) -> Result<String, RenderError> {
        if headings.is_empty() {
            return Ok(String::new());
        }

        let mut context = Context::new();
        context.insert("title", &self.labels.toc_title);
        context.insert("headings", headings);
        Ok(self.tera.render("toc.html", &context)?)
    }

    /// Render the full page for one study.
    pub fn render_study_page(&self, study: &Study) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("study", &self.study_view(study));
        context.insert("toc", &study.toc);
        context.insert("content", &study.html_content);
        let content = self.tera.render("study_body.html", &context)?;

        let title = html_escape(study.title());
        let description = html_escape(&format!(
            "{} {}",
            self.labels.description_prefix,
            study.title()
        ));

        Ok(fill_placeholders(
            &self.templates.study,
            &[
                (TITLE_PLACEHOLDER, &title),
                (DESCRIPTION_PLACEHOLDER, &description),
                (CONTENT_PLACEHOLDER, &content),
            ],
        ))
    }

    /// Render the index page: featured cards and the list of all studies,
    /// newest first.
    pub fn render_index_page(
        &self,
        studies: &[Study],
        featured: &[FeaturedStudy],
    ) -> Result<String, RenderError> {
        let featured_section = self.render_featured_section(studies, featured)?;
        let all_studies = self.render_study_list(studies)?;

        Ok(fill_placeholders(
            &self.templates.index,
            &[
                (FEATURED_PLACEHOLDER, &featured_section),
                (ALL_STUDIES_PLACEHOLDER, &all_studies),
            ],
        ))
    }

    fn render_featured_section(
        &self,
        studies: &[Study],
        featured: &[FeaturedStudy],
    ) -> Result<String, RenderError> {
        let cards: Vec<FeaturedCard> = featured
            .iter()
            .filter_map(|entry| {
                studies
                    .iter()
                    .find(|study| study.slug() == entry.slug)
                    .map(|study| FeaturedCard {
                        study: self.study_view(study),
                        reason: &entry.reason,
                    })
            })
            .collect();

        if cards.is_empty() {
            return Ok(String::new());
        }

        let mut context = Context::new();
        context.insert("featured_title", &self.labels.featured_title);
        context.insert("cards", &cards);
        Ok(self.tera.render("featured.html", &context)?)
    }

    fn render_study_list(&self, studies: &[Study]) -> Result<String, RenderError> {
        let views: Vec<StudyView> = sort_newest_first(studies)
            .into_iter()
            .map(|study| self.study_view(study))
            .collect();

        let mut context = Context::new();
        context.insert("studies", &views);
        Ok(self.tera.render("study_list.html", &context)?)
    }

    fn study_view<'a>(&self, study: &'a Study) -> StudyView<'a> {
        StudyView {
            title: &study.metadata.title,
            banner: &study.metadata.banner,
            date: self.format_date(study.metadata.date),
            tags: &study.metadata.tags,
            url: slug_to_url(study.slug()),
        }
    }

    // The format was validated in `new`, so formatting cannot fail
    fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}

/// Studies ordered by date, newest first; equal dates keep their input order.
pub fn sort_newest_first(studies: &[Study]) -> Vec<&Study> {
    let mut sorted: Vec<&Study> = studies.iter().collect();
    sorted.sort_by(|a, b| b.metadata.date.cmp(&a.metadata.date));
    sorted
}

fn html_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    match value {
        tera::Value::String(s) => Ok(tera::Value::String(html_escape(s))),
        other => Err(tera::Error::msg(format!(
            "filter `html` expects a string, got {other}"
        ))),
    }
}
