//! Download menu fragment
//!
//! Renders the `{resources, button_class}` context as a dropdown of download
//! links grouped by format.

use std::fmt::Write;

use serde::Serialize;

use crate::links::ResourceLinks;

/// Button class used when the caller does not pick one
pub const DEFAULT_BUTTON_CLASS: &str = "btn-default";

/// Context of the download menu fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadMenu {
    /// Links grouped by format
    pub resources: ResourceLinks,
    /// CSS class of the toggle button
    pub button_class: String,
}

impl DownloadMenu {
    /// Menu with the default button class
    pub fn new(resources: ResourceLinks) -> Self {
        Self::from_links(resources, DEFAULT_BUTTON_CLASS)
    }

    /// Menu with an explicit button class
    pub fn from_links(resources: ResourceLinks, button_class: impl Into<String>) -> Self {
        Self {
            resources,
            button_class: button_class.into(),
        }
    }

    /// Render the fragment as HTML
    pub fn render(&self) -> String {
        let mut html = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_html(&mut html);
        html
    }

    fn write_html(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, r#"<div class="btn-group export-download">"#)?;
        writeln!(
            out,
            r#"  <button type="button" class="btn {} dropdown-toggle" data-toggle="dropdown" aria-haspopup="true" aria-expanded="false">Download <span class="caret"></span></button>"#,
            escape_html(&self.button_class)
        )?;
        writeln!(out, r#"  <ul class="dropdown-menu">"#)?;

        for (i, group) in self.resources.iter().enumerate() {
            if i > 0 {
                writeln!(out, r#"    <li role="separator" class="divider"></li>"#)?;
            }
            writeln!(
                out,
                r#"    <li class="dropdown-header">{}</li>"#,
                group.format.code().to_uppercase()
            )?;
            for link in &group.links {
                writeln!(
                    out,
                    r#"    <li><a href="{}">{}</a></li>"#,
                    escape_html(&link.url),
                    escape_html(&link.label)
                )?;
            }
        }

        writeln!(out, "  </ul>")?;
        writeln!(out, "</div>")
    }
}

/// Escape text for HTML content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::{build_links, route_for};
    use crate::query::QueryParams;
    use crate::resource::{FieldResource, Resource};
    use crate::view::ViewConfiguration;
    use std::sync::Arc;

    fn links() -> ResourceLinks {
        let resources: Vec<Arc<dyn Resource>> = vec![
            Arc::new(FieldResource::new("BookResource", "book")),
            Arc::new(FieldResource::new("R", "book").with_description("Books <all>")),
        ];
        let config = ViewConfiguration::from_codes("BookList", resources, &["csv", "xls"]).unwrap();
        build_links(&config, &QueryParams::parse("q=a"), route_for("/{model}/export/"))
    }

    #[test]
    fn test_render_groups_by_format() {
        let html = DownloadMenu::new(links()).render();
        assert!(html.contains(r#"class="btn btn-default dropdown-toggle""#));
        let csv = html.find(">CSV<").unwrap();
        let xls = html.find(">XLS<").unwrap();
        assert!(csv < xls);
        assert_eq!(html.matches("<li><a href=").count(), 4);
        assert_eq!(html.matches(r#"class="divider""#).count(), 1);
    }

    #[test]
    fn test_render_escapes() {
        let html = DownloadMenu::from_links(links(), "btn-primary\"x").render();
        assert!(html.contains("Books &lt;all&gt;"));
        assert!(html.contains("btn-primary&quot;x"));
        assert!(html.contains(r#"href="/book/export/?q=a&amp;resource_class=0&amp;resource_format=csv""#));
    }

    #[test]
    fn test_context_serializes() {
        let menu = DownloadMenu::new(links());
        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(json["button_class"], "btn-default");
        assert_eq!(json["resources"]["xls"][0]["label"], "BookResource");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a&b<'c'>"), "a&amp;b&lt;&#x27;c&#x27;&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
