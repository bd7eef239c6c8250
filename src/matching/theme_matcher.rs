//! Picks a background image whose representative color suits a theme.
//!
//! Each image is scored against the theme's background, accent and text
//! colors (lower is better). Images whose hue is too far from the accent are
//! gated out unless that would leave nothing, the best fraction of the
//! remainder forms a pool, and the pick is uniform within the pool so that
//! repeated matches for one theme do not always land on the same image.

use crate::color::space::{hue_similarity, weighted_distance, LabWeights, Rgb};
use crate::color::theme::ThemeColors;
use crate::data::image_set::ImageSet;
use crate::matching::error::MatchError;
use crate::matching::history::{ThemeHistory, DEFAULT_HISTORY_CAP};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    pub background_weight: f64,
    pub accent_weight: f64,
    pub text_weight: f64,
    pub hue_weight: f64,
    /// Minimum accent hue similarity (exclusive) to pass the gate.
    pub hue_gate: f64,
    pub pool_fraction: f64,
    pub history_cap: usize,
    pub lab_weights: LabWeights,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            background_weight: 0.3,
            accent_weight: 0.3,
            text_weight: 0.2,
            hue_weight: 0.2,
            hue_gate: 0.5,
            pool_fraction: 0.3,
            history_cap: DEFAULT_HISTORY_CAP,
            lab_weights: LabWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredImage {
    pub index: usize,
    pub score: f64,
    pub hue_similarity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub index: usize,
    pub score: f64,
    /// True when no image passed the hue gate.
    pub used_fallback: bool,
    /// Indices eligible for the random pick, best first.
    pub pool: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeMatcher {
    tuning: MatchTuning,
}

impl ThemeMatcher {
    pub fn new(tuning: MatchTuning) -> Self {
        Self { tuning }
    }

    pub fn score(&self, index: usize, profile: Rgb, theme: &ThemeColors) -> ScoredImage {
        let t = &self.tuning;
        let w = &t.lab_weights;
        let bg = weighted_distance(profile, theme.background, w);
        let accent = weighted_distance(profile, theme.accent, w);
        let text = weighted_distance(profile, theme.text, w);
        let hue = hue_similarity(profile, theme.accent);

        let score = t.background_weight * bg
            + t.accent_weight * accent
            + t.text_weight * text
            + t.hue_weight * (1.0 - hue);

        ScoredImage { index, score, hue_similarity: hue }
    }

    /// Scores every image, in image order.
    pub fn score_all(&self, images: &ImageSet, theme: &ThemeColors) -> Result<Vec<ScoredImage>, MatchError> {
        check_profiles(images)?;
        Ok(images
            .profiles()
            .iter()
            .enumerate()
            .map(|(i, p)| self.score(i, *p, theme))
            .collect())
    }

    /// Best-first candidate pool and whether the hue gate had to be dropped.
    pub fn candidate_pool(&self, scored: &[ScoredImage]) -> (Vec<ScoredImage>, bool) {
        let mut pool: Vec<ScoredImage> = scored
            .iter()
            .filter(|s| s.hue_similarity > self.tuning.hue_gate)
            .copied()
            .collect();

        let used_fallback = pool.is_empty();
        if used_fallback {
            pool = scored.to_vec();
        }

        pool.sort_by(|a, b| a.score.total_cmp(&b.score));
        let keep = pool_size(pool.len(), self.tuning.pool_fraction);
        pool.truncate(keep);
        (pool, used_fallback)
    }

    /// Selects an image for `theme` and returns it with the theme's history
    /// after recording the pick.
    pub fn select_match<R: Rng + ?Sized>(
        &self,
        images: &ImageSet,
        theme: &ThemeColors,
        history: &ThemeHistory,
        rng: &mut R,
    ) -> Result<(MatchOutcome, ThemeHistory), MatchError> {
        let scored = self.score_all(images, theme)?;
        let (pool, used_fallback) = self.candidate_pool(&scored);
        if used_fallback {
            log::info!(
                "no image within accent hue gate {}; falling back to best {} of {} by score",
                self.tuning.hue_gate,
                pool.len(),
                scored.len()
            );
        }

        let pick = pool[rng.gen_range(0..pool.len())];
        log::debug!("picked image {} (score {:.3}) from pool of {}", pick.index, pick.score, pool.len());

        let mut updated = history.clone();
        updated.record(pick.index, self.tuning.history_cap);

        let outcome = MatchOutcome {
            index: pick.index,
            score: pick.score,
            used_fallback,
            pool: pool.iter().map(|s| s.index).collect(),
        };
        Ok((outcome, updated))
    }
}

fn check_profiles(images: &ImageSet) -> Result<(), MatchError> {
    if images.is_empty() {
        return Err(MatchError::NoCandidates);
    }
    if images.len() != images.profiles().len() {
        return Err(MatchError::ProfilesStale {
            images: images.len(),
            profiles: images.profiles().len(),
        });
    }
    Ok(())
}

/// `ceil(len * fraction)`, at least one and at most `len`.
fn pool_size(len: usize, fraction: f64) -> usize {
    let n = (len as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize;
    n.clamp(1, len.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn purple_theme() -> ThemeColors {
        ThemeColors {
            background: Rgb::from_u8(26, 15, 46),
            accent: Rgb::from_u8(157, 78, 221),
            text: Rgb::from_u8(255, 255, 255),
        }
    }

    fn set(profiles: &[(u8, u8, u8)]) -> ImageSet {
        let mut images = ImageSet::default();
        for (i, p) in profiles.iter().enumerate() {
            images.push(format!("img-{i}.png"), Rgb::from(*p));
        }
        images
    }

    #[test]
    fn accent_like_image_scores_best() {
        let images = set(&[(30, 20, 50), (200, 180, 60), (150, 80, 220)]);
        let matcher = ThemeMatcher::default();
        let scored = matcher.score_all(&images, &purple_theme()).unwrap();

        let best = scored.iter().min_by(|a, b| a.score.total_cmp(&b.score)).unwrap();
        assert_eq!(best.index, 2);
        assert!(scored[2].hue_similarity > 0.9);
        assert!(scored[1].hue_similarity < 0.5);

        let (pool, fallback) = matcher.candidate_pool(&scored);
        assert!(!fallback);
        assert_eq!(pool.iter().map(|s| s.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn picks_stay_in_pool() {
        let images = set(&[(30, 20, 50), (200, 180, 60), (150, 80, 220)]);
        let matcher = ThemeMatcher::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let (out, hist) = matcher
                .select_match(&images, &purple_theme(), &ThemeHistory::new(), &mut rng)
                .unwrap();
            assert_eq!(out.index, 2);
            assert_eq!(hist.indices(), &[2]);
        }
    }

    #[test]
    fn single_image_always_wins() {
        let images = set(&[(240, 200, 10)]);
        let matcher = ThemeMatcher::default();
        let mut rng = StdRng::seed_from_u64(1);
        let (out, hist) = matcher
            .select_match(&images, &purple_theme(), &ThemeHistory::new(), &mut rng)
            .unwrap();
        assert_eq!(out.index, 0);
        assert_eq!(out.pool, vec![0]);
        assert_eq!(hist.indices(), &[0]);
    }

    #[test]
    fn fallback_keeps_top_thirty_percent() {
        // Yellow-green hues, all far from a violet accent.
        let profiles: Vec<(u8, u8, u8)> = (0..10u8).map(|i| (180 + i * 5, 200, 20 + i * 3)).collect();
        let images = set(&profiles);
        let matcher = ThemeMatcher::default();
        let theme = purple_theme();

        let scored = matcher.score_all(&images, &theme).unwrap();
        assert!(scored.iter().all(|s| s.hue_similarity <= 0.5));

        let mut by_score = scored.clone();
        by_score.sort_by(|a, b| a.score.total_cmp(&b.score));
        let top3: Vec<usize> = by_score.iter().take(3).map(|s| s.index).collect();

        let mut rng = StdRng::seed_from_u64(42);
        let mut history = ThemeHistory::new();
        for _ in 0..50 {
            let (out, next) = matcher.select_match(&images, &theme, &history, &mut rng).unwrap();
            assert!(out.used_fallback);
            assert_eq!(out.pool, top3);
            assert!(top3.contains(&out.index));
            history = next;
        }
        assert!(history.len() <= 3);
    }

    #[test]
    fn seeded_picks_vary_within_pool() {
        // Violet shades all pass the gate; 12 of 40 form the pool.
        let profiles: Vec<(u8, u8, u8)> = (0..40u8).map(|i| (140 + i, 70, 210)).collect();
        let images = set(&profiles);
        let matcher = ThemeMatcher::default();
        let mut rng = StdRng::seed_from_u64(21);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..60 {
            let (out, _) = matcher
                .select_match(&images, &purple_theme(), &ThemeHistory::new(), &mut rng)
                .unwrap();
            assert_eq!(out.pool.len(), 12);
            assert!(out.pool.contains(&out.index));
            seen.insert(out.index);
        }
        assert!(seen.len() > 1, "always picked {seen:?}");

        // Same seed, same sequence.
        let replay = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| {
                    matcher
                        .select_match(&images, &purple_theme(), &ThemeHistory::new(), &mut rng)
                        .unwrap()
                        .0
                        .index
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(replay(5), replay(5));
    }

    #[test]
    fn empty_set_has_no_candidates() {
        let err = ThemeMatcher::default()
            .select_match(&ImageSet::default(), &purple_theme(), &ThemeHistory::new(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, MatchError::NoCandidates);
    }

    #[test]
    fn mismatched_profiles_are_stale() {
        let images = ImageSet::from_parts(vec!["a".into(), "b".into()], vec![Rgb::from_u8(1, 2, 3)]);
        let err = ThemeMatcher::default().score_all(&images, &purple_theme()).unwrap_err();
        assert_eq!(err, MatchError::ProfilesStale { images: 2, profiles: 1 });
    }

    #[test]
    fn pool_size_rounds_up() {
        assert_eq!(pool_size(1, 0.3), 1);
        assert_eq!(pool_size(2, 0.3), 1);
        assert_eq!(pool_size(4, 0.3), 2);
        assert_eq!(pool_size(10, 0.3), 3);
        assert_eq!(pool_size(5, 0.0), 1);
        assert_eq!(pool_size(5, 2.0), 5);
    }

    #[test]
    fn history_never_exceeds_cap() {
        let profiles: Vec<(u8, u8, u8)> = (0..40u8).map(|i| (140 + i, 70, 210)).collect();
        let images = set(&profiles);
        let matcher = ThemeMatcher::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut history = ThemeHistory::new();
        for _ in 0..200 {
            let (out, next) = matcher.select_match(&images, &purple_theme(), &history, &mut rng).unwrap();
            assert!(out.index < images.len());
            history = next;
            assert!(history.len() <= 5);
        }
    }

    #[test]
    fn weights_are_tunable() {
        let images = set(&[(30, 20, 50), (150, 80, 220)]);
        let tuning = MatchTuning {
            background_weight: 1.0,
            accent_weight: 0.0,
            text_weight: 0.0,
            hue_weight: 0.0,
            ..MatchTuning::default()
        };
        let scored = ThemeMatcher::new(tuning).score_all(&images, &purple_theme()).unwrap();
        assert!(scored[0].score < scored[1].score);
    }
}
