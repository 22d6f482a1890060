//! Markdown rendering with heading anchors and client-side highlighted code blocks.

use std::collections::HashSet;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::config::MarkdownConfig;
use crate::util::html_escape;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// A markdown renderer with a fixed set of parser options.
///
/// Built once from configuration at the start of a build and shared
/// read-only by every document.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new(markdown_config: &MarkdownConfig) -> Result<Self, MarkdownError> {
        let mut options = Options::empty();
        for extension in &markdown_config.extensions {
            match extension.as_str() {
                "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "gfm" => options.insert(Options::ENABLE_GFM),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tables" => options.insert(Options::ENABLE_TABLES),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                other => return Err(MarkdownError::InvalidExtension(other.to_string())),
            }
        }
        Ok(Self { options })
    }

    /// Render markdown to HTML.
    ///
    /// Headings get a unique `id` and a self-link; code blocks are escaped and
    /// tagged with a `language-*` class for a client-side highlighter.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);

        let mut code_block: Option<CodeBlock> = None;
        let mut heading: Option<HeadingState> = None;
        let mut used_heading_ids: HashSet<String> = HashSet::new();
        let mut events: Vec<Event> = Vec::new();

        for event in parser {
            match event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(HeadingState {
                        level,
                        id: id.map(|id| id.to_string()),
                        classes: classes.iter().map(|c| c.to_string()).collect(),
                        attrs: attrs
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                            .collect(),
                        inner: Vec::new(),
                        text: String::new(),
                        has_link: false,
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(state) = heading.take() {
                        let html = state.into_html(&mut used_heading_ids);
                        events.push(Event::Html(html.into()));
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(CodeBlock::new(kind));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        events.push(Event::Html(block.into_html().into()));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some(block) = code_block.as_mut() {
                        block.content.push_str(&text);
                    }
                }
                event => match heading.as_mut() {
                    Some(state) => state.push(event),
                    None => events.push(event),
                },
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

/// A code block being accumulated.
struct CodeBlock {
    /// `None` for indented blocks, the first word of the info string for fenced ones
    language: Option<String>,
    fenced: bool,
    content: String,
}

impl CodeBlock {
    fn new(kind: CodeBlockKind) -> Self {
        let (fenced, language) = match kind {
            CodeBlockKind::Fenced(info) => (
                true,
                info.split_whitespace().next().map(|lang| lang.to_string()),
            ),
            CodeBlockKind::Indented => (false, None),
        };
        Self {
            language,
            fenced,
            content: String::new(),
        }
    }

    fn into_html(self) -> String {
        let escaped = html_escape(&self.content);
        match (self.fenced, self.language) {
            (true, Some(lang)) => format!(
                "<pre class=\"line-numbers\"><code class=\"language-{}\">{}</code></pre>\n",
                html_escape(&lang),
                escaped
            ),
            (true, None) => format!(
                "<pre class=\"line-numbers\"><code>{}</code></pre>\n",
                escaped
            ),
            (false, _) => format!("<pre><code>{}</code></pre>\n", escaped),
        }
    }
}

/// A heading being accumulated until its end tag.
struct HeadingState<'a> {
    level: HeadingLevel,
    /// Explicit id from `{#id}` heading attributes
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    inner: Vec<Event<'a>>,
    /// Plain text content, used to derive the id
    text: String,
    has_link: bool,
}

impl<'a> HeadingState<'a> {
    fn push(&mut self, event: Event<'a>) {
        match &event {
            Event::Text(text) | Event::Code(text) => self.text.push_str(text),
            Event::Start(Tag::Link { .. }) => self.has_link = true,
            _ => {}
        }
        self.inner.push(event);
    }

    fn into_html(self, used_ids: &mut HashSet<String>) -> String {
        let id = match self.id {
            Some(id) => id,
            None => unique_id(&slugify(&self.text), used_ids),
        };
        used_ids.insert(id.clone());

        let mut inner_html = String::new();
        html::push_html(&mut inner_html, self.inner.into_iter());

        let class_attr = if self.classes.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", html_escape(&self.classes.join(" ")))
        };

        let extra_attrs = self
            .attrs
            .iter()
            .map(|(k, v)| match v {
                Some(val) => format!(" {}=\"{}\"", k, html_escape(val)),
                None => format!(" {}", k),
            })
            .collect::<String>();

        // Links cannot nest, so headings that already contain one get no self-link
        let body = if self.has_link {
            inner_html
        } else {
            format!(
                "<a class=\"header-anchor\" href=\"#{}\">{}</a>",
                html_escape(&id),
                inner_html
            )
        };

        let level = self.level as usize;
        format!(
            "<h{level} id=\"{}\"{class_attr}{extra_attrs} tabindex=\"-1\">{body}</h{level}>\n",
            html_escape(&id),
        )
    }
}

fn unique_id(base_id: &str, used_ids: &HashSet<String>) -> String {
    let mut id = base_id.to_string();
    let mut suffix = 1;
    while used_ids.contains(&id) {
        id = format!("{}-{}", base_id, suffix);
        suffix += 1;
    }
    id
}

/// Convert heading text to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    let slug: String = s
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
