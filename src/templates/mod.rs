//! Template rendering collaborator.
//!
//! # Responsibilities
//! - Turn a typed [`Page`] into body bytes
//!
//! # Design Decisions
//! - Handlers depend on the `Templates` trait only, never on template internals
//! - Pages with variables are askama templates under `resources/templates/`,
//!   compiled into the binary and HTML-escaped on render
//! - Pages without variables are served verbatim

use askama::Template;
use axum::body::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to render template: {0}")]
    Render(#[from] askama::Error),
}

/// Every page the exerciser can render, with the values it needs.
#[derive(Debug, Clone, Copy)]
pub enum Page<'a> {
    Index { base_url: &'a str },
    FormsPost { post_url: &'a str },
    Moby,
    Utf8Demo,
    SampleXml,
}

/// Renders pages.
pub trait Templates: Send + Sync {
    fn render(&self, page: Page<'_>) -> Result<Bytes, TemplateError>;
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "forms-post.html")]
struct FormsPostTemplate<'a> {
    post_url: &'a str,
}

const MOBY_HTML: &str = include_str!("../../resources/templates/moby.html");
const UTF8_DEMO_TXT: &str = include_str!("../../resources/templates/UTF-8-demo.txt");
const SAMPLE_XML: &str = include_str!("../../resources/templates/sample.xml");

/// Templates compiled into the binary by askama.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompiledTemplates;

impl Templates for CompiledTemplates {
    fn render(&self, page: Page<'_>) -> Result<Bytes, TemplateError> {
        let body = match page {
            Page::Index { base_url } => IndexTemplate { base_url }.render()?,
            Page::FormsPost { post_url } => FormsPostTemplate { post_url }.render()?,
            Page::Moby => return Ok(Bytes::from_static(MOBY_HTML.as_bytes())),
            Page::Utf8Demo => return Ok(Bytes::from_static(UTF8_DEMO_TXT.as_bytes())),
            Page::SampleXml => return Ok(Bytes::from_static(SAMPLE_XML.as_bytes())),
        };
        Ok(Bytes::from(body))
    }
}
