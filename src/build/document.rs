use std::collections::BTreeMap;

use serde_yaml::Value;

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid front matter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Front matter metadata parsed from a document.
///
/// Values are kept as raw YAML: the study processor decides which fields
/// are required and how they are interpreted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Get a raw field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a scalar field as a trimmed string.
    ///
    /// Numbers and booleans are stringified. Empty strings, null, lists and
    /// mappings count as absent.
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    /// Get a field as a list of strings.
    ///
    /// A sequence yields its scalar items in order; a single scalar becomes a
    /// one-element list; anything else is an empty list.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Tagged(tagged) => return scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

/// Result of parsing front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if none found)
    pub front_matter: FrontMatter,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Parse front matter from markdown content.
///
/// Front matter is a YAML block delimited by `---` lines at the start of the file:
///
/// ```markdown
/// ---
/// title: Binary Search Trees
/// banner: /assets/bst.png
/// date: 2024-03-01
/// tags: [trees, data-structures]
/// ---
///
/// # Content starts here
/// ```
///
/// Returns the parsed front matter and the remaining content. A file without
/// an opening delimiter, or without a closing one, has no front matter.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, FrontMatterError> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let Some(after_opening) = strip_delimiter_line(content) else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content: content.to_string(),
        });
    };

    // Find the closing delimiter line
    let mut offset = 0;
    for line in after_opening.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml_content = &after_opening[..offset];
            let markdown_content = after_opening[offset + line.len()..]
                .trim_start_matches(['\r', '\n'])
                .to_string();

            return Ok(ParsedContent {
                front_matter: parse_yaml(yaml_content)?,
                content: markdown_content,
            });
        }
        offset += line.len();
    }

    Ok(ParsedContent {
        front_matter: FrontMatter::default(),
        content: content.to_string(),
    })
}

/// If the first line is exactly `---`, return everything after it.
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let (first, rest) = match content.find('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => (content, ""),
    };
    (first.trim_end() == "---").then_some(rest)
}

fn parse_yaml(yaml: &str) -> Result<FrontMatter, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Ok(FrontMatter::default()),
        Value::Mapping(mapping) => {
            let mut fields = BTreeMap::new();
            for (key, value) in mapping {
                let key = scalar_to_string(&key).ok_or(FrontMatterError::NotAMapping)?;
                fields.insert(key, value);
            }
            Ok(FrontMatter { fields })
        }
        _ => Err(FrontMatterError::NotAMapping),
    }
}
