use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::{is_image, validate_name, GalleryError, GalleryStore};

/// Filesystem adapter for [`GalleryStore`]: years and albums are directories
/// under `root`, photos are the image files inside them.
#[derive(Clone, Debug)]
pub struct FsGallery {
    root: PathBuf,
}

impl FsGallery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn year_dir(&self, year: &str) -> Result<PathBuf, GalleryError> {
        validate_name(year)?;
        Ok(self.root.join(year))
    }

    fn album_dir(&self, year: &str, album: &str) -> Result<PathBuf, GalleryError> {
        validate_name(year)?;
        validate_name(album)?;
        Ok(self.root.join(year).join(album))
    }

    fn subdirectories(&self, dir: &Path) -> Result<Vec<String>, GalleryError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn walk_images(&self, dir: &Path, found: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.walk_images(&path, found)?;
            } else if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                if is_image(name) {
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        found.push(relative.to_string_lossy().into_owned());
                    }
                }
            }
        }
        Ok(())
    }
}

impl GalleryStore for FsGallery {
    fn list_years(&self) -> Result<Vec<String>, GalleryError> {
        self.subdirectories(&self.root)
    }

    fn year_photos(&self, year: &str) -> Result<Vec<String>, GalleryError> {
        let dir = self.year_dir(year)?;
        if !dir.is_dir() {
            return Err(GalleryError::YearNotFound);
        }

        let mut photos = Vec::new();
        self.walk_images(&dir, &mut photos)?;
        photos.sort();
        Ok(photos)
    }

    fn list_albums(&self, year: &str) -> Result<Vec<String>, GalleryError> {
        let dir = self.year_dir(year)?;
        if !dir.is_dir() {
            return Err(GalleryError::YearNotFound);
        }

        self.subdirectories(&dir)
    }

    fn list_photos(&self, year: &str, album: &str) -> Result<Vec<String>, GalleryError> {
        let dir = self.album_dir(year, album)?;
        if !dir.is_dir() {
            return Err(GalleryError::AlbumNotFound);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if is_image(name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn create_year(&self, name: &str) -> Result<(), GalleryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let dir = self.year_dir(name)?;
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn delete_year(&self, name: &str) -> Result<(), GalleryError> {
        let dir = self.year_dir(name)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn create_album(&self, year: &str, name: &str) -> Result<(), GalleryError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        // Creates the year along the way if it is missing, like the
        // recursive directory creation it maps to.
        let dir = self.album_dir(year, name)?;
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn delete_album(&self, year: &str, name: &str) -> Result<(), GalleryError> {
        let dir = self.album_dir(year, name)?;
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn photo_path(&self, relative: &str) -> Result<PathBuf, GalleryError> {
        let relative = Path::new(relative);
        if relative.components().next().is_none() {
            return Err(GalleryError::PhotoNotFound);
        }
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(GalleryError::PathEscapesRoot);
        }

        let root = self.root.canonicalize()?;
        let resolved = match root.join(relative).canonicalize() {
            Ok(path) => path,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(GalleryError::PhotoNotFound)
            },
            Err(err) => return Err(err.into()),
        };

        // Canonicalization resolves symlinks, so a link pointing outside
        // the root fails this check even when every component is normal.
        if !resolved.starts_with(&root) {
            return Err(GalleryError::PathEscapesRoot);
        }
        if !resolved.is_file() {
            return Err(GalleryError::PhotoNotFound);
        }

        Ok(resolved)
    }
}
