use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::areas::stage::Stage;
use crate::areas::workspace::Workspace;
use crate::areas::{CONTROL_DIR, OBJECTS_DIR, STAGE_DIR, TEMP_DIR};
use crate::config::Config;
use crate::errors::{IoResultExt, RepositoryError, Result};
use std::cell::{RefCell, RefMut};
use std::path::Path;

/// Handle on one repository
///
/// Every operation goes through this handle, so tests can point one at a
/// temporary directory and capture its output through the writer.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    database: Database,
    stage: Stage,
    workspace: Workspace,
    refs: Refs,
    config: Config,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>) -> Result<Self> {
        Self::with_config(path, writer, Config::load_from_env())
    }

    pub fn with_config(
        path: &str,
        writer: Box<dyn std::io::Write>,
        config: Config,
    ) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path).with_path("create directory", path)?;
        }
        let path = path.canonicalize().with_path("resolve", path)?;
        let control_path = path.join(CONTROL_DIR);

        Ok(Repository {
            database: Database::new(control_path.join(OBJECTS_DIR).into_boxed_path()),
            stage: Stage::new(control_path.join(STAGE_DIR).into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(control_path.into_boxed_path()),
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn control_path(&self) -> Box<Path> {
        self.path.join(CONTROL_DIR).into_boxed_path()
    }

    pub fn temp_path(&self) -> Box<Path> {
        self.control_path().join(TEMP_DIR).into_boxed_path()
    }

    pub fn is_initialized(&self) -> bool {
        self.control_path().is_dir() && self.refs.head_path().is_file()
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(RepositoryError::NotInitialized(self.path.to_path_buf()))
        }
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
