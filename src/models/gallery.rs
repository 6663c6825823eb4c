use serde::Serialize;

/// A year row on the index page: directory name plus a randomly chosen
/// cover drawn from anywhere under it.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub name: String,
    pub cover: Option<String>,
}

/// An album row on a year page. The cover is a bare file name within the
/// album; templates build the photo URL from (year, album, cover).
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct AlbumEntry {
    pub name: String,
    pub cover: Option<String>,
}
