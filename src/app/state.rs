use crate::color::space::Rgb;
use crate::color::theme::Theme;
use crate::data::assets;
use crate::data::config::Config;
use crate::data::history_store::{HistoryRepository, TomlHistoryStore};
use crate::data::image_set::ImageSet;
use crate::data::library::Library;
use crate::data::theme_loader::ThemeLoader;
use crate::matching::{MatchError, MatchOutcome, ThemeMatcher};
use crate::render::dominant_color::{dominant_rgb_from_image_bytes, DominantColorProfiler};
use crate::render::profile_cache::{ProfileCache, ProfileKey};
use anyhow::{anyhow, Context, Result};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Selection {
    pub theme: Theme,
    pub image: String,
    pub outcome: MatchOutcome,
}

/// Everything a session needs, passed around explicitly.
pub struct AppState {
    pub config: Config,
    root: PathBuf,
    themes: ThemeLoader,
    matcher: ThemeMatcher,
    profiler: DominantColorProfiler,
    cache: ProfileCache,
    history: Box<dyn HistoryRepository>,
    images: ImageSet,
}

impl AppState {
    /// Opens the asset root, seeding config and themes on first use.
    pub fn open(root: &Path) -> Result<Self> {
        assets::ensure_assets_ready(root)?;
        let config = Config::load_from(&root.join("config/default.toml"))?;
        let history = TomlHistoryStore::new(root.join("state/history.toml"), config.matching.history_cap);
        let mut app = Self::with_history(root, config, Box::new(history));
        app.images = Library::load(&app.library_path())?.to_image_set();
        Ok(app)
    }

    pub fn with_history(root: &Path, config: Config, history: Box<dyn HistoryRepository>) -> Self {
        Self {
            root: root.to_path_buf(),
            themes: ThemeLoader::new(root.join("themes")),
            matcher: ThemeMatcher::new(config.matching),
            profiler: DominantColorProfiler::new(config.quantize_bits),
            cache: ProfileCache::new(config.profile_cache),
            history,
            images: ImageSet::default(),
            config,
        }
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn themes(&self) -> &ThemeLoader {
        &self.themes
    }

    pub fn matcher(&self) -> &ThemeMatcher {
        &self.matcher
    }

    pub fn history(&self) -> &dyn HistoryRepository {
        self.history.as_ref()
    }

    fn library_path(&self) -> PathBuf {
        self.root.join("state/library.toml")
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config/default.toml")
    }

    /// Representative color of one image file.
    pub fn profile_file(&mut self, path: &Path) -> Result<Rgb> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let key = ProfileKey::for_bytes(&bytes, self.config.profile_max_side);
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }
        let rgb = dominant_rgb_from_image_bytes(&bytes, self.config.profile_max_side, &self.profiler)
            .ok_or_else(|| anyhow!("cannot decode image {}", path.display()))?;
        self.cache.put(key, rgb);
        Ok(rgb)
    }

    /// Replaces the image set wholesale. Undecodable files are skipped.
    /// History from the previous set is meaningless and is dropped.
    pub fn replace_images(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let started = Instant::now();
        let mut set = ImageSet::default();
        for path in paths {
            match self.profile_file(path) {
                Ok(rgb) => set.push(path.display().to_string(), rgb),
                Err(e) => log::warn!("skipping {}: {e:#}", path.display()),
            }
        }
        log::info!(
            "profiled {} of {} images in {:?}",
            set.len(),
            paths.len(),
            started.elapsed()
        );

        self.images = set;
        self.history.clear()?;
        self.persist_library()?;
        Ok(self.images.len())
    }

    /// Recomputes every profile from the stored image paths. Images that
    /// are gone or undecodable are dropped; if any are, indices shift and
    /// history is cleared.
    pub fn refresh_profiles(&mut self) -> Result<()> {
        let current = self.images.current_id().map(str::to_string);
        let ids: Vec<String> = self.images.ids().to_vec();
        let mut kept = ImageSet::default();
        for id in ids {
            match self.profile_file(Path::new(&id)) {
                Ok(rgb) => kept.push(id, rgb),
                Err(e) => log::warn!("dropping {id}: {e:#}"),
            }
        }

        let dropped = self.images.len() - kept.len();
        if dropped > 0 {
            log::info!("dropped {dropped} unreadable images");
            self.history.clear()?;
        }
        kept.current = current.and_then(|c| kept.ids().iter().position(|id| *id == c));
        self.images = kept;
        self.persist_library()
    }

    /// Picks a background for `theme_id`, records it in the theme history
    /// and remembers it as the current image.
    pub fn select_for_theme<R: Rng + ?Sized>(&mut self, theme_id: &str, rng: &mut R) -> Result<Selection> {
        // Themes may be edited between calls.
        let theme = self.themes.load(theme_id)?;
        let history = self.history.load(theme_id)?;

        let result = self.matcher.select_match(&self.images, &theme.colors, &history, rng);
        let (outcome, updated) = match result {
            Err(MatchError::ProfilesStale { images, profiles }) => {
                log::info!("recomputing profiles ({profiles} stored for {images} images)");
                self.refresh_profiles()?;
                self.matcher.select_match(&self.images, &theme.colors, &history, rng)?
            }
            other => other?,
        };

        if updated != history {
            self.history.save(theme_id, &updated)?;
        }
        self.images.set_current(outcome.index);
        self.persist_library()?;

        let image = self.images.ids()[outcome.index].clone();
        Ok(Selection { theme, image, outcome })
    }

    /// Drops every image, profile and history entry.
    pub fn reset(&mut self) -> Result<()> {
        self.images.clear();
        self.cache.clear();
        self.history.clear()?;
        Library::remove(&self.library_path())
    }

    pub fn set_theme(&mut self, theme_id: &str) -> Result<Theme> {
        let theme = self.themes.load(theme_id)?;
        self.config.theme = theme.id.clone();
        self.config.save_to(&self.config_path())?;
        Ok(theme)
    }

    fn persist_library(&self) -> Result<()> {
        Library::from_image_set(&self.images).save(&self.library_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::history_store::MemoryHistoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn write_png(path: &Path, rgb: [u8; 3]) {
        image::RgbImage::from_pixel(8, 8, image::Rgb(rgb)).save(path).unwrap();
    }

    #[test]
    fn select_without_images_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = AppState::with_history(dir.path(), Config::default(), Box::new(MemoryHistoryStore::default()));
        let err = app
            .select_for_theme("dark-purple", &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<MatchError>(), Some(&MatchError::NoCandidates));
    }

    #[test]
    fn stale_profiles_are_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("violet.png");
        write_png(&img, [150, 80, 220]);

        let lib = Library {
            current: None,
            images: vec![crate::data::library::LibraryEntry { path: img.display().to_string(), profile: None }],
        };
        lib.save(&dir.path().join("state/library.toml")).unwrap();

        let mut app = AppState::open(dir.path()).unwrap();
        assert!(app.images().is_stale());

        let sel = app.select_for_theme("dark-purple", &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(sel.outcome.index, 0);
        assert!(!app.images().is_stale());
        assert_eq!(app.images().profiles()[0].to_u8(), (150, 80, 220));
    }

    #[test]
    fn refresh_drops_unreadable_images() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.png");
        let violet = dir.path().join("violet.png");
        write_png(&violet, [150, 80, 220]);
        fs::write(dir.path().join("junk.png"), b"not an image").unwrap();

        let entry = |p: &Path| crate::data::library::LibraryEntry { path: p.display().to_string(), profile: None };
        let lib = Library {
            current: Some(1),
            images: vec![entry(&gone), entry(&violet), entry(&dir.path().join("junk.png"))],
        };
        lib.save(&dir.path().join("state/library.toml")).unwrap();

        let mut app = AppState::open(dir.path()).unwrap();
        let sel = app.select_for_theme("dark-purple", &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(sel.image, violet.display().to_string());
        assert_eq!(app.images().len(), 1);
        assert!(!app.images().is_stale());

        let reopened = Library::load(&dir.path().join("state/library.toml")).unwrap();
        assert_eq!(reopened.images.len(), 1);
    }

    #[test]
    fn refresh_keeps_current_image_and_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, [30, 20, 50]);
        write_png(&b, [150, 80, 220]);

        let mut app = AppState::with_history(dir.path(), Config::default(), Box::new(MemoryHistoryStore::default()));
        app.replace_images(&[a.clone(), b.clone()]).unwrap();
        app.select_for_theme("dark-purple", &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(!app.history().load_all().unwrap().is_empty());

        // Remove whichever image was not picked.
        let picked = app.images().current_id().unwrap().to_string();
        let other = if picked == a.display().to_string() { &b } else { &a };
        fs::remove_file(other).unwrap();

        app.refresh_profiles().unwrap();
        assert_eq!(app.images().len(), 1);
        assert_eq!(app.images().current_id(), Some(picked.as_str()));
        assert!(app.history().load_all().unwrap().is_empty());
    }

    #[test]
    fn replacing_images_clears_history() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        write_png(&a, [30, 20, 50]);

        let mut app = AppState::with_history(dir.path(), Config::default(), Box::new(MemoryHistoryStore::default()));
        app.replace_images(&[a.clone(), dir.path().join("missing.png")]).unwrap();
        assert_eq!(app.images().len(), 1);

        app.select_for_theme("light", &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(app.history().load("light").unwrap().indices(), &[0]);

        app.replace_images(&[a]).unwrap();
        assert!(app.history().load_all().unwrap().is_empty());
    }
}
