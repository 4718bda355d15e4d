//! JSON file persistence for the cart.

use super::{Cart, CartError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CartStore {
    path: PathBuf,
}

impl CartStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable cart file yields an empty cart.
    pub fn load(&self) -> Cart {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved cart");
                return Cart::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read cart file");
                return Cart::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(cart) => cart,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Error parsing cart file, starting empty");
                Cart::new()
            }
        }
    }

    /// Writes to a sibling temp file, then renames over the old one.
    pub fn save(&self, cart: &Cart) -> Result<(), CartError> {
        let json = serde_json::to_string_pretty(cart)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| CartError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), items = cart.items().len(), "Cart saved");
        Ok(())
    }
}
