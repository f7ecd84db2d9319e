//! Download link building
//!
//! For every allowed format (outer) and every resource (inner), a link is
//! built from the current request's query parameters with the two selector
//! parameters set. Links either target a dedicated export endpoint or the
//! current page.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::format::FormatCode;
use crate::query::QueryParams;
use crate::resource::ResourceDescriptor;
use crate::view::ViewConfiguration;

/// One download link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLink {
    /// Target URL including the query string
    pub url: String,
    /// Label shown in the menu
    pub label: String,
}

/// Links of one format, in resource order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatLinks {
    /// Format of every link in the group
    pub format: FormatCode,
    /// One link per resource
    pub links: Vec<ResourceLink>,
}

/// Download links grouped by format, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLinks {
    groups: Vec<FormatLinks>,
}

impl ResourceLinks {
    /// Links of a format
    pub fn get(&self, format: FormatCode) -> Option<&[ResourceLink]> {
        self.groups
            .iter()
            .find(|g| g.format == format)
            .map(|g| g.links.as_slice())
    }

    /// Groups in format order
    pub fn iter(&self) -> impl Iterator<Item = &FormatLinks> {
        self.groups.iter()
    }

    /// Formats in order
    pub fn formats(&self) -> impl Iterator<Item = FormatCode> + '_ {
        self.groups.iter().map(|g| g.format)
    }

    /// Number of formats
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no links at all
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Serialize for ResourceLinks {
    /// Serialized as `{ "<code>": [ { url, label }, ... ] }`
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(group.format.code(), &group.links)?;
        }
        map.end()
    }
}

/// Build the download links of a view
///
/// # Arguments
/// * `config` - Validated view configuration
/// * `base_params` - Query parameters of the current request, left untouched
/// * `url_for` - Target URL of a resource (empty for the current page)
///
/// # Returns
/// * `ResourceLinks` - One group per allowed format, one link per resource
pub fn build_links<F>(config: &ViewConfiguration, base_params: &QueryParams, url_for: F) -> ResourceLinks
where
    F: Fn(&ResourceDescriptor) -> String,
{
    let parameters = config.parameters();
    let groups = config
        .formats()
        .iter()
        .map(|&format| {
            let links = config
                .descriptors()
                .iter()
                .map(|descriptor| {
                    let mut params = base_params.clone();
                    params.set(
                        parameters.resource_class.as_str(),
                        descriptor.identity().to_string(),
                    );
                    params.set(parameters.resource_format.as_str(), format.code());

                    ResourceLink {
                        url: format!("{}?{}", url_for(descriptor), params.to_query_string()),
                        label: descriptor.label().to_string(),
                    }
                })
                .collect();
            FormatLinks { format, links }
        })
        .collect();

    ResourceLinks { groups }
}

/// Build links that target the current page with the download marker set
///
/// The marker is added without a value (`?download=&...`) ahead of the
/// selector parameters, unless the request already carries it.
pub fn build_page_links(config: &ViewConfiguration, base_params: &QueryParams) -> ResourceLinks {
    let mut params = base_params.clone();
    let marker = config.parameters().download.as_str();
    if !params.contains(marker) {
        params.append(marker, "");
    }
    build_links(config, &params, same_page)
}

/// Target of same-page links: the query string alone
pub fn same_page(_: &ResourceDescriptor) -> String {
    String::new()
}

/// Target resolver for dedicated export routes
///
/// `{model}` in the pattern is replaced by the resource's model name, e.g.
/// `/{model}/export/` gives `/book/export/`.
pub fn route_for(pattern: &str) -> impl Fn(&ResourceDescriptor) -> String + '_ {
    move |descriptor| pattern.replace("{model}", descriptor.model_name())
}
