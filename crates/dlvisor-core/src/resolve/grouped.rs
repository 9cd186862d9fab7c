use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::Deserialize;

use super::{extract_id, read, Resolution, ResolveError, Resolver};

#[derive(Deserialize)]
#[serde(untagged)]
enum Group {
    Links(Vec<String>),
    Other(IgnoredAny),
}

/// `.yaml`, `.toml` or `.json` file mapping group names to lists of links.
///
/// Groups are read in name order.
#[derive(Debug, Clone)]
pub struct GroupedLinkFile {
    path: PathBuf,
}

impl GroupedLinkFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse_error(&self, message: impl ToString) -> ResolveError {
        ResolveError::Parse {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl Resolver for GroupedLinkFile {
    fn resolve(&self) -> Result<Resolution, ResolveError> {
        let text = read(&self.path)?;
        let groups: BTreeMap<String, Group> =
            match self.path.extension().and_then(|e| e.to_str()) {
                Some("json") => serde_json::from_str(&text).map_err(|e| self.parse_error(e))?,
                Some("yaml") | Some("yml") => {
                    serde_yaml::from_str(&text).map_err(|e| self.parse_error(e))?
                }
                _ => toml::from_str(&text).map_err(|e| self.parse_error(e))?,
            };

        let mut ids = Vec::new();
        let mut malformed = 0;
        for (name, group) in groups {
            let links = match group {
                Group::Links(links) => links,
                Group::Other(_) => {
                    return Err(ResolveError::Format {
                        path: self.path.clone(),
                        group: name,
                    })
                }
            };
            for link in links {
                match extract_id(&link) {
                    Some(id) => ids.push(id),
                    None => malformed += 1,
                }
            }
        }
        Ok(Resolution::from_ids(ids, malformed))
    }
}
