use uuid::Uuid;

use crate::models::Wallpaper;

/// In-session collection of generated wallpapers, newest first.
#[derive(Debug, Default)]
pub struct Gallery {
    wallpapers: Vec<Wallpaper>,
    selected: Option<Uuid>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, wallpaper: Wallpaper) {
        self.wallpapers.insert(0, wallpaper);
    }

    pub fn get(&self, id: Uuid) -> Option<&Wallpaper> {
        self.wallpapers.iter().find(|wallpaper| wallpaper.id == id)
    }

    /// Flips the favorite flag and returns the new value; `None` if `id` is
    /// not in the gallery.
    pub fn toggle_favorite(&mut self, id: Uuid) -> Option<bool> {
        let wallpaper = self
            .wallpapers
            .iter_mut()
            .find(|wallpaper| wallpaper.id == id)?;
        wallpaper.favorite = !wallpaper.favorite;
        Some(wallpaper.favorite)
    }

    /// Selects `id` for the detail view. Unknown ids leave the selection as is.
    pub fn select(&mut self, id: Uuid) -> Option<&Wallpaper> {
        let index = self
            .wallpapers
            .iter()
            .position(|wallpaper| wallpaper.id == id)?;
        self.selected = Some(id);
        self.wallpapers.get(index)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Wallpaper> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Wallpaper> {
        self.wallpapers.iter()
    }

    pub fn favorites(&self) -> impl Iterator<Item = &Wallpaper> {
        self.wallpapers.iter().filter(|wallpaper| wallpaper.favorite)
    }

    pub fn len(&self) -> usize {
        self.wallpapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallpapers.is_empty()
    }
}
