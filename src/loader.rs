//! Where module sources come from.

use std::{collections::HashMap, fs, io, path::PathBuf, rc::Rc};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Source text of one module along with the path shown in diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: String,
    pub text: String,
}

pub trait SourceLoader {
    /// Loads module `name`. Failures are fatal; `requested_at` is the import
    /// that asked for it.
    fn load(&mut self, name: &str, requested_at: &Position) -> Result<LoadedSource, Error>;
}

/// Reads `<root>/<name>.lang` from disk.
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub const EXTENSION: &'static str = "lang";

    pub fn new(root: PathBuf) -> Self {
        FileLoader { root }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, Self::EXTENSION))
    }
}

impl SourceLoader for FileLoader {
    fn load(&mut self, name: &str, requested_at: &Position) -> Result<LoadedSource, Error> {
        let path = self.path_of(name);
        let shown = path.to_string_lossy().to_string();

        match fs::read_to_string(&path) {
            Ok(text) => Ok(LoadedSource { path: shown, text }),
            Err(error) => {
                tracing::debug!(target: "loader", path = %shown, %error, "read failed");
                let kind = if error.kind() == io::ErrorKind::NotFound {
                    ErrorImpl::ModuleNotFound {
                        module: name.to_string(),
                    }
                } else {
                    ErrorImpl::FileUnreadable { path: shown }
                };
                Err(Error::fatal(kind, requested_at.clone()))
            }
        }
    }
}

/// Serves modules from memory. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    sources: HashMap<String, Rc<String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader {
            sources: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.sources.insert(name.to_string(), Rc::new(text.to_string()));
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&mut self, name: &str, requested_at: &Position) -> Result<LoadedSource, Error> {
        let path = format!("{}.{}", name, FileLoader::EXTENSION);
        match self.sources.get(name) {
            Some(text) => Ok(LoadedSource {
                path,
                text: text.as_str().to_string(),
            }),
            None => Err(Error::fatal(
                ErrorImpl::ModuleNotFound {
                    module: name.to_string(),
                },
                requested_at.clone(),
            )),
        }
    }
}
