use crate::color::space::Rgb;

/// Ordered image identifiers with their profiles at the same position.
///
/// The two vectors only disagree in length when profiles have gone stale;
/// the matcher refuses to run in that state.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImageSet {
    ids: Vec<String>,
    profiles: Vec<Rgb>,
    pub current: Option<usize>,
}

impl ImageSet {
    pub fn from_parts(ids: Vec<String>, profiles: Vec<Rgb>) -> Self {
        Self { ids, profiles, current: None }
    }

    pub fn push(&mut self, id: String, profile: Rgb) {
        self.ids.push(id);
        self.profiles.push(profile);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn profiles(&self) -> &[Rgb] {
        &self.profiles
    }

    pub fn is_stale(&self) -> bool {
        self.ids.len() != self.profiles.len()
    }

    pub fn get(&self, index: usize) -> Option<(&str, Option<Rgb>)> {
        let id = self.ids.get(index)?;
        Some((id.as_str(), self.profiles.get(index).copied()))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.and_then(|i| self.ids.get(i)).map(String::as_str)
    }

    pub fn set_current(&mut self, index: usize) {
        self.current = (index < self.ids.len()).then_some(index);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.profiles.clear();
        self.current = None;
    }
}
