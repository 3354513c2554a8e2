//! Client workspace existence check.

use crate::models::client::ClientName;
use std::path::PathBuf;

pub trait WorkspaceCheck {
    fn exists(&self, client: &ClientName) -> bool;
}

/// Looks for `<root>/<client>`. Without a root every client is accepted.
#[derive(Debug, Clone, Default)]
pub struct DirWorkspaces {
    pub root: Option<PathBuf>,
}

impl DirWorkspaces {
    pub fn new(root: Option<&str>) -> Self {
        Self {
            root: root.map(PathBuf::from),
        }
    }
}

impl WorkspaceCheck for DirWorkspaces {
    fn exists(&self, client: &ClientName) -> bool {
        match &self.root {
            Some(root) => root.join(client.as_str()).is_dir(),
            None => true,
        }
    }
}
