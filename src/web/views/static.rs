use poem::{handler, IntoResponse};

const CACHE_CONTROL: &str = "public, max-age=3600";

#[handler]
pub async fn get_script_js() -> impl IntoResponse {
    include_bytes!("static/script.js")
        .with_content_type("application/javascript")
        .with_header("Cache-Control", CACHE_CONTROL)
}
