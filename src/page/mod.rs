//! Views composed from a configuration and a dispatcher
//!
//! Two shapes share one policy:
//!
//! - [`ExportView`]: a dedicated endpoint that always exports; its links
//!   point at per-model export routes.
//! - [`ListPage`]: an existing listing page that exports only when the
//!   download marker is in the query, and renders itself otherwise; its links
//!   point back at the page.

use std::sync::Arc;

use tracing::debug;

use crate::dispatch::{DownloadDispatcher, DownloadRequest, DownloadResponse};
use crate::error::Result;
use crate::links::{ResourceLinks, build_links, build_page_links, route_for};
use crate::menu::DownloadMenu;
use crate::query::QueryParams;
use crate::resource::ResourceDescriptor;
use crate::view::ViewConfiguration;

/// Default export route, `{model}` is replaced by the model name
pub const DEFAULT_EXPORT_ROUTE: &str = "/{model}/export/";

type UrlResolver = Arc<dyn Fn(&ResourceDescriptor) -> String + Send + Sync>;

/// Standalone export endpoint
#[derive(Clone)]
pub struct ExportView {
    dispatcher: DownloadDispatcher,
    export_url: UrlResolver,
}

impl ExportView {
    /// Endpoint using the default export route for links
    pub fn new(dispatcher: DownloadDispatcher) -> Self {
        Self::with_route(dispatcher, DEFAULT_EXPORT_ROUTE)
    }

    /// Endpoint whose links follow a route pattern
    pub fn with_route(dispatcher: DownloadDispatcher, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self {
            dispatcher,
            export_url: Arc::new(move |descriptor: &ResourceDescriptor| {
                route_for(&pattern)(descriptor)
            }),
        }
    }

    /// Endpoint with a custom URL resolver
    pub fn with_resolver<F>(dispatcher: DownloadDispatcher, resolver: F) -> Self
    where
        F: Fn(&ResourceDescriptor) -> String + Send + Sync + 'static,
    {
        Self {
            dispatcher,
            export_url: Arc::new(resolver),
        }
    }

    /// View configuration
    pub fn config(&self) -> &ViewConfiguration {
        self.dispatcher.config()
    }

    /// Export URL of a resource
    pub fn export_url(&self, descriptor: &ResourceDescriptor) -> String {
        (self.export_url)(descriptor)
    }

    /// Download links for the current query
    pub fn resource_links(&self, params: &QueryParams) -> ResourceLinks {
        build_links(self.config(), params, |d| self.export_url(d))
    }

    /// Download menu for the current query
    pub fn menu(&self, params: &QueryParams, button_class: &str) -> DownloadMenu {
        DownloadMenu::from_links(self.resource_links(params), button_class)
    }

    /// Export for every request
    pub fn handle(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        self.dispatcher.dispatch(request)
    }

    /// Export for every request, as an HTTP response
    pub fn respond(&self, request: &DownloadRequest) -> http::Response<Vec<u8>> {
        self.dispatcher.respond(request)
    }
}

/// What the listing page renders with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Download links back to this page
    pub resources: ResourceLinks,
    /// Query parameters of the request
    pub params: QueryParams,
}

/// Outcome of a listing page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome<T> {
    /// The marker was present: the exported file
    Download(DownloadResponse),
    /// Normal page rendering
    Page(T),
}

/// Listing page with same-page downloads
#[derive(Clone)]
pub struct ListPage {
    dispatcher: DownloadDispatcher,
}

impl ListPage {
    /// Attach downloads to a listing page
    pub fn new(dispatcher: DownloadDispatcher) -> Self {
        Self { dispatcher }
    }

    /// View configuration
    pub fn config(&self) -> &ViewConfiguration {
        self.dispatcher.config()
    }

    /// Whether a request asks for a download
    pub fn wants_download(&self, request: &DownloadRequest) -> bool {
        request.params.contains(&self.config().parameters().download)
    }

    /// Download links pointing back at this page
    pub fn resource_links(&self, params: &QueryParams) -> ResourceLinks {
        build_page_links(self.config(), params)
    }

    /// Download menu for the current query
    pub fn menu(&self, params: &QueryParams, button_class: &str) -> DownloadMenu {
        DownloadMenu::from_links(self.resource_links(params), button_class)
    }

    /// Dispatch when the marker is present, render otherwise
    ///
    /// # Arguments
    /// * `request` - Incoming request
    /// * `render` - Normal page rendering, given the download links
    ///
    /// # Returns
    /// * `Result<PageOutcome<T>>` - Exported file or rendered page
    pub fn handle<T, R>(&self, request: &DownloadRequest, render: R) -> Result<PageOutcome<T>>
    where
        R: FnOnce(PageContext) -> T,
    {
        if self.wants_download(request) {
            debug!("Download marker present on {}", self.config().name());
            return self.dispatcher.dispatch(request).map(PageOutcome::Download);
        }

        let context = PageContext {
            resources: self.resource_links(&request.params),
            params: request.params.clone(),
        };
        Ok(PageOutcome::Page(render(context)))
    }

    /// Same as [`ListPage::handle`], always producing an HTTP response
    pub fn respond<R>(&self, request: &DownloadRequest, render: R) -> http::Response<Vec<u8>>
    where
        R: FnOnce(PageContext) -> http::Response<Vec<u8>>,
    {
        if self.wants_download(request) {
            return self.dispatcher.respond(request);
        }
        let context = PageContext {
            resources: self.resource_links(&request.params),
            params: request.params.clone(),
        };
        render(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExportDownloadError, RequestError};
    use crate::format::FormatCode;
    use crate::records::StaticRecords;
    use crate::resource::{FieldResource, Resource};
    use http::{Method, StatusCode};
    use serde_json::json;

    fn dispatcher() -> DownloadDispatcher {
        let resources: Vec<Arc<dyn Resource>> = vec![
            Arc::new(FieldResource::new("BookResource", "book").with_fields(["title"])),
            Arc::new(FieldResource::new("AuthorResource", "author").with_fields(["author"])),
        ];
        let config =
            Arc::new(ViewConfiguration::from_codes("BookList", resources, &["csv", "json"]).unwrap());
        let source = Arc::new(
            StaticRecords::from_json(json!([{ "title": "Dune", "author": "Herbert" }])).unwrap(),
        );
        DownloadDispatcher::new(config, source)
    }

    #[test]
    fn test_export_view_links_use_routes() {
        let view = ExportView::new(dispatcher());
        let links = view.resource_links(&QueryParams::new());
        let csv = links.get(FormatCode::Csv).unwrap();
        assert_eq!(csv[0].url, "/book/export/?resource_class=0&resource_format=csv");
        assert_eq!(csv[1].url, "/author/export/?resource_class=1&resource_format=csv");
    }

    #[test]
    fn test_export_view_custom_resolver() {
        let view = ExportView::with_resolver(dispatcher(), |d| format!("/dl/{}", d.identity()));
        let links = view.resource_links(&QueryParams::new());
        assert!(links.get(FormatCode::Json).unwrap()[1].url.starts_with("/dl/1?"));
    }

    #[test]
    fn test_export_view_always_exports() {
        let view = ExportView::new(dispatcher());
        let response = view.handle(&DownloadRequest::get("")).unwrap();
        assert_eq!(response.body, b"title\nDune\n");
        assert_eq!(
            view.respond(&DownloadRequest::new(Method::POST, QueryParams::new()))
                .status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_list_page_renders_without_marker() {
        let page = ListPage::new(dispatcher());
        let outcome = page
            .handle(&DownloadRequest::get("q=dune"), |ctx| {
                ctx.resources.get(FormatCode::Csv).unwrap()[0].url.clone()
            })
            .unwrap();
        assert_eq!(
            outcome,
            PageOutcome::Page("?q=dune&download=&resource_class=0&resource_format=csv".to_string())
        );
    }

    #[test]
    fn test_list_page_downloads_with_marker() {
        let page = ListPage::new(dispatcher());
        let outcome = page
            .handle(
                &DownloadRequest::get("download&resource_class=1"),
                |_: PageContext| -> u8 { panic!("page must not render") },
            )
            .unwrap();
        match outcome {
            PageOutcome::Download(response) => {
                assert_eq!(response.content_type, "text/csv");
                assert_eq!(response.body, b"author\nHerbert\n");
            }
            PageOutcome::Page(_) => panic!("expected a download"),
        }
    }

    #[test]
    fn test_list_page_marker_errors_are_not_found() {
        let page = ListPage::new(dispatcher());
        let result = page.handle(&DownloadRequest::get("download=1&resource_format=xls"), |_| ());
        assert!(matches!(
            result,
            Err(ExportDownloadError::Request(RequestError::NotFound(_)))
        ));
    }

    #[test]
    fn test_list_page_respond() {
        let page = ListPage::new(dispatcher());
        let rendered = page.respond(&DownloadRequest::get(""), |ctx| {
            http::Response::new(DownloadMenu::new(ctx.resources).render().into_bytes())
        });
        assert_eq!(rendered.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(rendered.body()).contains("dropdown-menu"));

        let downloaded = page.respond(&DownloadRequest::get("download"), |_| {
            http::Response::new(Vec::new())
        });
        assert_eq!(downloaded.headers()[http::header::CONTENT_TYPE], "text/csv");
    }
}
