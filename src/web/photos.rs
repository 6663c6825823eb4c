use percent_encoding::percent_decode_str;
use tide::{Request, Response};

use crate::gallery::GalleryError;

pub(super) fn mount(app: &mut tide::Server<crate::State>) {
    app.at("/photo/*path").get(serve_photo);
}

/// Streams raw image bytes by root-relative path. Unauthenticated, so the
/// containment check is the only thing standing between the request and the
/// filesystem.
async fn serve_photo(req: Request<crate::State>) -> tide::Result<Response> {
    let relative = percent_decode_str(req.param("path")?)
        .decode_utf8_lossy()
        .to_string();

    let path = match req.state().gallery.photo_path(&relative) {
        Ok(path) => path,
        Err(GalleryError::PhotoNotFound) => {
            return Ok(Response::new(tide::http::StatusCode::NotFound))
        },
        Err(GalleryError::PathEscapesRoot) => {
            tide::log::warn!("rejected photo path escaping the root: {:?}", relative);
            return Ok(Response::new(tide::http::StatusCode::Forbidden));
        },
        Err(err) => return Err(err.into()),
    };

    // Body::from_file picks the content type from the file extension.
    let body = match tide::Body::from_file(&path).await {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Response::new(tide::http::StatusCode::NotFound))
        },
        Err(err) => return Err(err.into()),
    };

    let res = Response::builder(tide::http::StatusCode::Ok)
        .body(body)
        .build();
    Ok(res)
}
