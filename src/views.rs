// HTML view rendering.
// All `*.html` templates in the views directory are loaded once at startup
// into an immutable cache; handlers render them by name with a JSON-valued
// data context. The template language is deliberately tiny: `{{field}}`
// substitutes an HTML-escaped scalar, and `{{#field}}...{{/field}}` repeats
// its body once per element of an array field with `{{.}}` bound to the
// element. Unknown fields render as empty strings, like a missing map key
// would in most template engines.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Data context passed to [`ViewCache::render`]: view field names mapped to
/// arbitrary JSON values.
pub type ViewData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no such view: {0}")]
    UnknownView(String),
}

/// Immutable set of named view templates, built once at startup and shared
/// read-only for the process lifetime.
pub struct ViewCache {
    views: HashMap<String, String>,
}

impl ViewCache {
    /// Loads every `*.html` file in `dir` as a view named after its file
    /// stem. Other files are skipped.
    pub async fn load(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let mut views = HashMap::new();

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            tracing::info!("Loading view template: {}", path.display());
            let template = fs::read_to_string(&path).await?;
            views.insert(name.to_string(), template);
        }

        Ok(ViewCache { views })
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Renders the named view with the given data context.
    pub fn render(&self, name: &str, data: &ViewData) -> Result<String, RenderError> {
        let template = self
            .views
            .get(name)
            .ok_or_else(|| RenderError::UnknownView(name.to_string()))?;
        Ok(render_template(template, data))
    }
}

fn render_template(template: &str, data: &ViewData) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            // Unterminated tag: emit the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let tag = after[..end].trim();
        rest = &after[end + 2..];

        if let Some(section) = tag.strip_prefix('#') {
            let closing = format!("{{{{/{}}}}}", section);
            let Some(close) = rest.find(&closing) else {
                // No closing tag: drop the opener and keep going.
                continue;
            };
            let body = &rest[..close];
            rest = &rest[close + closing.len()..];

            // A section expands once per element of an array field; any
            // other value (or a missing field) expands to nothing.
            if let Some(serde_json::Value::Array(items)) = data.get(section) {
                for item in items {
                    out.push_str(&body.replace("{{.}}", &escape_html(&value_text(item))));
                }
            }
        } else if let Some(value) = data.get(tag) {
            out.push_str(&escape_html(&value_text(value)));
        }
    }

    out.push_str(rest);
    out
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn cache_with(files: &[(&str, &str)]) -> ViewCache {
        let dir = tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        ViewCache::load(dir.path()).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_keeps_only_html_files() {
        let cache = cache_with(&[
            ("upload.html", "<form></form>"),
            ("list.html", "<ol></ol>"),
            ("notes.txt", "not a view"),
            ("style.css", "body {}"),
        ])
        .await;

        assert_eq!(cache.len(), 2);
        assert!(cache.render("upload", &ViewData::new()).is_ok());
        assert!(matches!(
            cache.render("notes", &ViewData::new()),
            Err(RenderError::UnknownView(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let result = ViewCache::load(dir.path().join("does-not-exist")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_render_without_tags_is_passthrough() {
        let cache = cache_with(&[("plain.html", "<h1>Hello</h1>")]).await;
        let html = cache.render("plain", &ViewData::new()).unwrap();
        assert_eq!(html, "<h1>Hello</h1>");
    }

    #[tokio::test]
    async fn test_render_unknown_view() {
        let cache = cache_with(&[]).await;
        assert!(matches!(
            cache.render("missing", &ViewData::new()),
            Err(RenderError::UnknownView(_))
        ));
    }

    #[test]
    fn test_scalar_substitution_escapes_html() {
        let mut data = ViewData::new();
        data.insert("title".to_string(), "<b>&\"bold\"</b>".into());

        let html = render_template("<h1>{{title}}</h1>", &data);
        assert_eq!(html, "<h1>&lt;b&gt;&amp;&quot;bold&quot;&lt;/b&gt;</h1>");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let html = render_template("[{{absent}}]", &ViewData::new());
        assert_eq!(html, "[]");
    }

    #[test]
    fn test_section_repeats_per_element() {
        let mut data = ViewData::new();
        data.insert("images".to_string(), vec!["a.png", "b.png"].into());

        let html = render_template(
            "<ol>{{#images}}<li><a href=\"/view?id={{.}}\">{{.}}</a></li>{{/images}}</ol>",
            &data,
        );
        assert_eq!(
            html,
            "<ol><li><a href=\"/view?id=a.png\">a.png</a></li>\
             <li><a href=\"/view?id=b.png\">b.png</a></li></ol>"
        );
    }

    #[test]
    fn test_section_over_missing_field_renders_empty() {
        let html = render_template("<ol>{{#images}}<li>{{.}}</li>{{/images}}</ol>", &ViewData::new());
        assert_eq!(html, "<ol></ol>");
    }

    #[test]
    fn test_section_elements_are_escaped() {
        let mut data = ViewData::new();
        data.insert("images".to_string(), vec!["<script>.png"].into());

        let html = render_template("{{#images}}{{.}}{{/images}}", &data);
        assert_eq!(html, "&lt;script&gt;.png");
    }

    #[test]
    fn test_unterminated_tag_is_verbatim() {
        let html = render_template("before {{oops", &ViewData::new());
        assert_eq!(html, "before {{oops");
    }
}
