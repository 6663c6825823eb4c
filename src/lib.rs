use std::sync::Arc;

use structopt::StructOpt;

pub mod auth;
pub mod db;
pub mod gallery;
pub mod models;
pub mod telemetry;
pub mod web;

use gallery::{FsGallery, GalleryStore};

#[derive(Clone, Debug)]
pub struct State {
    pub args: Arc<Args>,
    pub db: sqlx::sqlite::SqlitePool,
    pub tera: Arc<tera::Tera>,
    pub gallery: Arc<dyn GalleryStore>,
}

#[derive(Debug)]
pub enum Error {
    TemplateParseError(tera::Error),
    TelemetryInitError(anyhow::Error),
    BootstrapError(db::Error),
}

impl From<Error> for i32 {
    fn from(error: Error) -> i32 {
        match error {
            Error::TemplateParseError(_) => 3,
            Error::TelemetryInitError(_) => 4,
            Error::BootstrapError(_) => 5,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TemplateParseError(err) => {
                write!(f, "Template parsing error: {}", err)
            },
            Error::TelemetryInitError(err) => {
                write!(f, "Failed to init telemetry: {}", err)
            },
            Error::BootstrapError(err) => {
                write!(f, "Failed to bootstrap user database: {}", err)
            },
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Args {
    /// Host address to bind to.
    #[structopt(long, default_value = "localhost", env = "PHOTO_ATTIC_BIND_ADDRESS")]
    address: String,
    /// Port to bind to.
    #[structopt(long, default_value = "8199", env = "PHOTO_ATTIC_BIND_PORT")]
    port: u16,

    /// SQLite database url holding the user table.
    #[structopt(
        long,
        default_value = "sqlite://users.db",
        env = "DATABASE_URL",
        hide_env_values = true
    )]
    database_url: String,

    /// Directory the year/album/photo tree lives under.
    #[structopt(
        long,
        parse(from_os_str),
        default_value = "./photos",
        env = "PHOTO_ATTIC_PHOTOS_PATH"
    )]
    photos_path: std::path::PathBuf,

    /// Secret used to sign session cookies. Must be at least 32 bytes.
    #[structopt(long, env = "PHOTO_ATTIC_SESSION_SECRET", hide_env_values = true)]
    session_secret: String,

    /// Username of the administrator account seeded at startup.
    #[structopt(long, env = "PHOTO_ATTIC_ADMIN_USERNAME")]
    admin_username: String,
    /// Password of the administrator account seeded at startup.
    #[structopt(long, env = "PHOTO_ATTIC_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Path to Tera templates directory
    #[structopt(
        long,
        parse(from_os_str),
        default_value = "./templates",
        env = "PHOTO_ATTIC_TEMPLATE_PATH"
    )]
    template_path: std::path::PathBuf,
}

pub async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    let args = Arc::new(Args::from_args());

    telemetry::init().map_err(Error::TelemetryInitError)?;

    let pool = db::get_pool(&args.database_url)
        .await
        .expect("couldn't get DB pool");

    {
        let mut conn = pool.acquire().await.expect("couldn't acquire DB connection");
        db::users::ensure_schema(&mut conn)
            .await
            .map_err(|err| Error::BootstrapError(err.into()))?;
        db::users::seed_admin(&mut conn, &args.admin_username, &args.admin_password)
            .await
            .map_err(Error::BootstrapError)?;
    }

    std::fs::create_dir_all(&args.photos_path).expect("couldn't create photo root");
    let photos_path = args
        .photos_path
        .canonicalize()
        .expect("could not canonicalize photo root");

    let template_path = args
        .template_path
        .canonicalize()
        .expect("could not canonicalize template path");
    let tera = match tera::Tera::new(&template_path.join("**/*.html").to_string_lossy()) {
        Ok(t) => t,
        Err(e) => {
            return Err(Error::TemplateParseError(e));
        },
    };

    let state = State {
        args: args.clone(),
        db: pool,
        tera: Arc::new(tera),
        gallery: Arc::new(FsGallery::new(photos_path)),
    };
    let mut app = tide::with_state(state);

    app.with(tide::sessions::SessionMiddleware::new(
        tide::sessions::MemoryStore::new(),
        args.session_secret.as_bytes(),
    ));

    web::mount(&mut app);

    let address: &str = args.address.as_ref();
    app.listen((address, args.port))
        .await
        .expect("starting tide app failed");

    Ok(())
}
