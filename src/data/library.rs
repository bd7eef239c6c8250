use crate::color::space::Rgb;
use crate::data::image_set::ImageSet;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Rgb>,
}

/// The persisted image set: identifiers, their profiles and the image
/// currently applied as background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<usize>,
    #[serde(default)]
    pub images: Vec<LibraryEntry>,
}

impl Library {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("write {}", path.display()))
    }

    pub fn remove(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Entries lacking a profile leave the set stale.
    pub fn to_image_set(&self) -> ImageSet {
        let ids = self.images.iter().map(|e| e.path.clone()).collect();
        let profiles = self.images.iter().filter_map(|e| e.profile).collect();
        let mut set = ImageSet::from_parts(ids, profiles);
        if let Some(i) = self.current {
            set.set_current(i);
        }
        set
    }

    pub fn from_image_set(set: &ImageSet) -> Self {
        let images = set
            .ids()
            .iter()
            .enumerate()
            .map(|(i, id)| LibraryEntry {
                path: id.clone(),
                profile: if set.is_stale() { None } else { set.profiles().get(i).copied() },
            })
            .collect();
        Self { current: set.current, images }
    }
}

/// Image files directly inside `dir`, sorted by path.
pub fn scan_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(anyhow!("not a directory: {}", dir.display()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_image(p: &Path) -> bool {
    let Some(ext) = p.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    matches!(
        ext.to_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_makes_set_stale() {
        let lib = Library {
            current: Some(1),
            images: vec![
                LibraryEntry { path: "a.png".into(), profile: Some(Rgb::from_u8(1, 2, 3)) },
                LibraryEntry { path: "b.png".into(), profile: None },
            ],
        };
        let set = lib.to_image_set();
        assert!(set.is_stale());
        assert_eq!(set.current_id(), Some("b.png"));
        assert!(Library::from_image_set(&set).images.iter().all(|e| e.profile.is_none()));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/library.toml");
        let mut set = ImageSet::default();
        set.push("x.jpg".into(), Rgb::new(10.5, 20.25, 30.0));
        set.set_current(0);
        let lib = Library::from_image_set(&set);
        lib.save(&path).unwrap();

        let back = Library::load(&path).unwrap();
        assert_eq!(back, lib);
        assert_eq!(back.to_image_set(), set);

        Library::remove(&path).unwrap();
        assert_eq!(Library::load(&path).unwrap(), Library::default());
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.webp"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();
        let names: Vec<String> = scan_images(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG", "c.webp"]);
    }
}
