use html_minifier::HTMLMinifier;
use tera::Context;
use thiserror::Error;
use tide::log::error;
use tide::Response;

use crate::State;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("rendering error")]
    Tera(#[from] tera::Error),
}

/// Renders a template into a ready `text/html` response, minifying the
/// output when possible and falling back to the raw rendering when not.
pub(super) fn render_page(
    state: &State,
    template: &'static str,
    context: &Context,
) -> Result<Response, TemplateError> {
    let rendered = state.tera.render(template, context)?;

    let mut html_minifier = HTMLMinifier::new();
    let body = if let Err(err) = html_minifier.digest(&rendered) {
        error!("Failed to minify HTML: {}", err);
        rendered
    } else {
        match std::str::from_utf8(html_minifier.get_html()) {
            Ok(minified) => minified.to_string(),
            Err(err) => {
                error!("Failed to parse minified HTML as UTF-8: {}", err);
                rendered
            },
        }
    };

    let res = Response::builder(tide::http::StatusCode::Ok)
        .content_type("text/html")
        .body(body)
        .build();
    Ok(res)
}

/// Session gate for every content-serving and mutating handler: yields the
/// signed-in username, or short-circuits with a redirect to the login page.
macro_rules! require_user {
    ($request:ident) => {
        match $request.session().get::<String>("user") {
            Some(user) => user,
            None => return Ok(tide::Redirect::new("/login").into()),
        }
    };
}
