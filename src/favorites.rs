//! The user's favorited launchers. New favorites go to the end; the dock
//! shows them in list order, which the user can rearrange.

use std::path::PathBuf;

use thiserror::Error;

use crate::window::WindowId;

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("failed to access favorites file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("favorites file '{path}' is not a JSON list of ids: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait Favorites: std::fmt::Debug {
    fn list(&self) -> Vec<WindowId>;

    fn contains(&self, id: &WindowId) -> bool {
        self.list().iter().any(|fav| fav == id)
    }

    /// Add or remove `id`. Returns whether it is a favorite afterwards.
    fn toggle(&mut self, id: &WindowId) -> Result<bool, FavoritesError>;

    /// Move favorite `id` to `index`, clamped to the end of the list.
    /// Returns false when `id` is not a favorite or is already there.
    fn move_to(&mut self, id: &WindowId, index: usize) -> Result<bool, FavoritesError>;
}

fn toggle_in(ids: &mut Vec<WindowId>, id: &WindowId) -> bool {
    if let Some(index) = ids.iter().position(|fav| fav == id) {
        ids.remove(index);
        false
    } else {
        ids.push(id.clone());
        true
    }
}

/// Returns the index `id` was moved from.
fn move_in(ids: &mut Vec<WindowId>, id: &WindowId, index: usize) -> Option<usize> {
    let from = ids.iter().position(|fav| fav == id)?;
    let to = index.min(ids.len() - 1);
    if from == to {
        return None;
    }
    let moved = ids.remove(from);
    ids.insert(to, moved);
    Some(from)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryFavorites {
    ids: Vec<WindowId>,
}

impl MemoryFavorites {
    pub fn new(ids: Vec<WindowId>) -> Self {
        Self { ids }
    }
}

impl Favorites for MemoryFavorites {
    fn list(&self) -> Vec<WindowId> {
        self.ids.clone()
    }

    fn toggle(&mut self, id: &WindowId) -> Result<bool, FavoritesError> {
        Ok(toggle_in(&mut self.ids, id))
    }

    fn move_to(&mut self, id: &WindowId, index: usize) -> Result<bool, FavoritesError> {
        Ok(move_in(&mut self.ids, id, index).is_some())
    }
}

/// Favorites persisted as a JSON array of ids in dock order, rewritten on
/// every change.
#[derive(Debug, Clone)]
pub struct JsonFileFavorites {
    path: PathBuf,
    ids: Vec<WindowId>,
}

impl JsonFileFavorites {
    /// Open the store at `path`. A missing file is an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FavoritesError> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => {
                serde_json::from_str(&text).map_err(|source| FavoritesError::Malformed {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(FavoritesError::Io { path, source }),
        };
        Ok(Self { path, ids })
    }

    fn save(&self) -> Result<(), FavoritesError> {
        let io_err = |source| FavoritesError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.ids).map_err(|source| {
            FavoritesError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

impl Favorites for JsonFileFavorites {
    fn list(&self) -> Vec<WindowId> {
        self.ids.clone()
    }

    fn toggle(&mut self, id: &WindowId) -> Result<bool, FavoritesError> {
        let now = toggle_in(&mut self.ids, id);
        if let Err(err) = self.save() {
            // Keep memory and disk in agreement.
            toggle_in(&mut self.ids, id);
            return Err(err);
        }
        tracing::debug!(id = %id, favorite = now, "favorites updated");
        Ok(now)
    }

    fn move_to(&mut self, id: &WindowId, index: usize) -> Result<bool, FavoritesError> {
        let Some(from) = move_in(&mut self.ids, id, index) else {
            return Ok(false);
        };
        if let Err(err) = self.save() {
            move_in(&mut self.ids, id, from);
            return Err(err);
        }
        tracing::debug!(id = %id, index, "favorite moved");
        Ok(true)
    }
}
