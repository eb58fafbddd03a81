//! Rendered pages, text fixtures and images.

use axum::http::{header, StatusCode};

use crate::handlers::status::status_code;
use crate::handlers::HandlerResult;
use crate::http::{response, Exchange};
use crate::resources::{Image, DENY_TXT, ROBOTS_TXT};
use crate::routing::Params;
use crate::templates::Page;

fn page(ex: &Exchange, which: Page<'_>, content_type: &'static str) -> HandlerResult {
    let body = ex.ctx.templates.render(which)?;
    Ok(response::with_type(StatusCode::OK, content_type, body))
}

/// `GET /`
pub async fn landing(ex: Exchange) -> HandlerResult {
    let base_url = format!("http://{}", ex.host());
    page(&ex, Page::Index { base_url: &base_url }, response::HTML)
}

/// `GET /html`
pub async fn html(ex: Exchange) -> HandlerResult {
    page(&ex, Page::Moby, response::HTML)
}

/// `GET /encoding/utf8`
pub async fn encoding_utf8(ex: Exchange) -> HandlerResult {
    page(&ex, Page::Utf8Demo, response::HTML)
}

/// `GET /xml`
pub async fn xml(ex: Exchange) -> HandlerResult {
    page(&ex, Page::SampleXml, "application/xml")
}

/// `GET /forms/post`
pub async fn forms_post(ex: Exchange) -> HandlerResult {
    let post_url = ex.url_for("post", &Params::new())?;
    page(&ex, Page::FormsPost { post_url: &post_url }, response::HTML)
}

/// `GET /robots.txt`
pub async fn robots(_ex: Exchange) -> HandlerResult {
    Ok(response::with_type(StatusCode::OK, response::TEXT, ROBOTS_TXT))
}

/// `GET /deny`
pub async fn deny(_ex: Exchange) -> HandlerResult {
    Ok(response::with_type(StatusCode::OK, response::TEXT, DENY_TXT))
}

fn image_response(image: Image) -> HandlerResult {
    Ok(response::with_type(StatusCode::OK, image.content_type(), image.bytes()))
}

/// `GET /image`: format chosen from `Accept`, 406 when nothing fits.
pub async fn image(ex: Exchange) -> HandlerResult {
    match Image::negotiate(ex.header(header::ACCEPT)) {
        Some(image) => image_response(image),
        None => status_code(&ex, 406),
    }
}

pub async fn image_png(_ex: Exchange) -> HandlerResult {
    image_response(Image::Png)
}

pub async fn image_jpeg(_ex: Exchange) -> HandlerResult {
    image_response(Image::Jpeg)
}

pub async fn image_webp(_ex: Exchange) -> HandlerResult {
    image_response(Image::Webp)
}

pub async fn image_svg(_ex: Exchange) -> HandlerResult {
    image_response(Image::Svg)
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    fn accepting(accept: &str) -> Request<Body> {
        Request::get("/image")
            .header("accept", accept)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_landing_uses_host() {
        let response = testing::get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        let body = String::from_utf8(testing::body(response).await.to_vec()).unwrap();
        assert!(body.contains("http://test.local/ip"));
        assert!(!body.contains("{{"));
    }

    #[tokio::test]
    async fn test_landing_escapes_hostile_host() {
        let request = Request::get("/")
            .header("host", "x\"><script>alert(1)</script>")
            .body(Body::empty())
            .unwrap();
        let body = testing::body(testing::send(request).await).await;
        let body = String::from_utf8_lossy(&body);
        assert!(!body.contains("<script>alert(1)</script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_forms_post_targets_post_route() {
        let body = testing::body(testing::get("/forms/post").await).await;
        assert!(String::from_utf8_lossy(&body).contains("action=\"/post\""));
    }

    #[tokio::test]
    async fn test_fixtures() {
        let robots = testing::get("/robots.txt").await;
        assert_eq!(robots.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert!(String::from_utf8_lossy(&testing::body(robots).await).contains("Disallow: /deny"));

        let xml = testing::get("/xml").await;
        assert_eq!(xml.headers()[header::CONTENT_TYPE], "application/xml");
    }

    #[tokio::test]
    async fn test_image_negotiation() {
        let webp = testing::send(accepting("image/webp,*/*")).await;
        assert_eq!(webp.headers()[header::CONTENT_TYPE], "image/webp");

        let any_image = testing::send(accepting("image/*")).await;
        assert_eq!(any_image.headers()[header::CONTENT_TYPE], "image/png");

        let refused = testing::send(accepting("text/html")).await;
        assert_eq!(refused.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(testing::json(refused).await["accept"][3], "image/png");

        let plain = testing::get("/image").await;
        assert_eq!(plain.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_fixed_format_images() {
        let svg = testing::get("/image/svg").await;
        assert_eq!(svg.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert!(!testing::body(svg).await.is_empty());

        let jpeg = testing::get("/image/jpeg").await;
        assert_eq!(&testing::body(jpeg).await[..2], &[0xff, 0xd8]);
    }
}
