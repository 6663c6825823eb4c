#[macro_use]
pub mod utils;

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tide::{Redirect, Request, Response};

use crate::db::users::UserProvider;
use crate::gallery::{self, GalleryError};
use crate::models::gallery::{AlbumEntry, YearEntry};

use utils::render_page;

pub(super) fn mount(route: &mut tide::Server<crate::State>) {
    route.at("/login").get(login_form).post(login);
    route.at("/logout").get(logout);

    route.at("/").get(index);
    route.at("/add_year").post(add_year);
    route.at("/delete_year/:year").post(delete_year);

    route.at("/year/:year").get(year_view);
    route.at("/year/:year/add_album").post(add_album);
    route.at("/year/:year/delete_album/:album").post(delete_album);
    route.at("/year/:year/:album").get(album_view);
}

fn decoded_param(req: &Request<crate::State>, name: &str) -> tide::Result<String> {
    Ok(percent_decode_str(req.param(name)?)
        .decode_utf8_lossy()
        .to_string())
}

fn not_found(message: &'static str) -> Response {
    Response::builder(tide::http::StatusCode::NotFound)
        .content_type("text/plain")
        .body(message)
        .build()
}

fn forbidden(message: &'static str) -> Response {
    Response::builder(tide::http::StatusCode::Forbidden)
        .content_type("text/plain")
        .body(message)
        .build()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_form(req: Request<crate::State>) -> tide::Result<Response> {
    if req.session().get::<String>("user").is_some() {
        return Ok(Redirect::new("/").into());
    }

    let context = tera::Context::new();
    Ok(render_page(req.state(), "login.html", &context)?)
}

async fn login(mut req: Request<crate::State>) -> tide::Result<Response> {
    let form: LoginForm = req.body_form().await?;

    let mut conn = req.state().db.acquire().await?;
    let user = conn.get_user_by_username(&form.username).await?;

    let valid = match &user {
        Some(user) => crate::auth::verify_password(&form.password, &user.password_hash)?,
        None => false,
    };

    if valid {
        tide::log::info!("user {:?} signed in", form.username);
        req.session_mut().insert("user", form.username)?;
        return Ok(Redirect::new("/").into());
    }

    tide::log::info!("failed login attempt for {:?}", form.username);
    let mut context = tera::Context::new();
    context.insert("error", "Invalid username or password");
    Ok(render_page(req.state(), "login.html", &context)?)
}

async fn logout(mut req: Request<crate::State>) -> tide::Result<Response> {
    req.session_mut().destroy();
    Ok(Redirect::new("/login").into())
}

async fn index(req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);
    let state = req.state();

    let mut rng = rand::thread_rng();
    let mut years = Vec::new();
    for name in state.gallery.list_years()? {
        let photos = state.gallery.year_photos(&name)?;
        let cover = gallery::choose_cover(&photos, &mut rng);
        years.push(YearEntry { name, cover });
    }

    let mut context = tera::Context::new();
    context.insert("years", &years);
    Ok(render_page(state, "index.html", &context)?)
}

#[derive(Deserialize)]
struct AddYearForm {
    year_name: String,
}

async fn add_year(mut req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);

    let form: AddYearForm = req.body_form().await?;
    match req.state().gallery.create_year(&form.year_name) {
        Ok(()) => Ok(Redirect::new("/").into()),
        Err(GalleryError::PathEscapesRoot) => Ok(forbidden("year name escapes the photo root")),
        Err(err) => Err(err.into()),
    }
}

async fn delete_year(req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);

    let year = decoded_param(&req, "year")?;
    match req.state().gallery.delete_year(&year) {
        Ok(()) => {
            tide::log::info!("deleted year {:?}", year);
            Ok(Redirect::new("/").into())
        },
        Err(GalleryError::PathEscapesRoot) => Ok(forbidden("year name escapes the photo root")),
        Err(err) => Err(err.into()),
    }
}

async fn year_view(req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);
    let state = req.state();

    let year = decoded_param(&req, "year")?;
    let album_names = match state.gallery.list_albums(&year) {
        Ok(names) => names,
        Err(GalleryError::YearNotFound) => return Ok(not_found("no such year")),
        Err(GalleryError::PathEscapesRoot) => {
            return Ok(forbidden("year name escapes the photo root"))
        },
        Err(err) => return Err(err.into()),
    };

    let mut rng = rand::thread_rng();
    let mut albums = Vec::new();
    for name in album_names {
        let photos = state.gallery.list_photos(&year, &name)?;
        let cover = gallery::choose_cover(&photos, &mut rng);
        albums.push(AlbumEntry { name, cover });
    }

    let mut context = tera::Context::new();
    context.insert("year", &year);
    context.insert("albums", &albums);
    Ok(render_page(state, "year.html", &context)?)
}

#[derive(Deserialize)]
struct AddAlbumForm {
    album_name: String,
}

async fn add_album(mut req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);

    let raw_year = req.param("year")?.to_string();
    let year = percent_decode_str(&raw_year).decode_utf8_lossy().to_string();

    let form: AddAlbumForm = req.body_form().await?;
    match req.state().gallery.create_album(&year, &form.album_name) {
        Ok(()) => Ok(Redirect::new(format!("/year/{}", raw_year)).into()),
        Err(GalleryError::PathEscapesRoot) => Ok(forbidden("album name escapes the photo root")),
        Err(err) => Err(err.into()),
    }
}

async fn delete_album(req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);

    let raw_year = req.param("year")?.to_string();
    let year = percent_decode_str(&raw_year).decode_utf8_lossy().to_string();
    let album = decoded_param(&req, "album")?;

    match req.state().gallery.delete_album(&year, &album) {
        Ok(()) => {
            tide::log::info!("deleted album {:?} of year {:?}", album, year);
            Ok(Redirect::new(format!("/year/{}", raw_year)).into())
        },
        Err(GalleryError::PathEscapesRoot) => Ok(forbidden("album name escapes the photo root")),
        Err(err) => Err(err.into()),
    }
}

async fn album_view(req: Request<crate::State>) -> tide::Result<Response> {
    require_user!(req);
    let state = req.state();

    let year = decoded_param(&req, "year")?;
    let album = decoded_param(&req, "album")?;

    let photos = match state.gallery.list_photos(&year, &album) {
        Ok(photos) => photos,
        Err(GalleryError::AlbumNotFound) => return Ok(not_found("no such album")),
        Err(GalleryError::PathEscapesRoot) => {
            return Ok(forbidden("album name escapes the photo root"))
        },
        Err(err) => return Err(err.into()),
    };

    let mut context = tera::Context::new();
    context.insert("year", &year);
    context.insert("album", &album);
    context.insert("photos", &photos);
    Ok(render_page(state, "album.html", &context)?)
}
