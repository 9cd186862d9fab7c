use std::path::{Path, PathBuf};

use url::Url;

use super::{read, Resolution, ResolveError, Resolver};

const ID_LEN: usize = 11;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// A bare video id: exactly 11 characters of `[A-Za-z0-9_-]`.
pub fn is_video_id(text: &str) -> bool {
    text.len() == ID_LEN && text.chars().all(is_id_char)
}

/// Video id from a link (`watch?v=`, `/shorts/<id>`, `youtu.be/<id>`) or a
/// bare id.
pub fn extract_id(link: &str) -> Option<String> {
    let link = link.trim();
    if is_video_id(link) {
        return Some(link.to_string());
    }
    let url = Url::parse(link)
        .or_else(|_| Url::parse(&format!("https://{link}")))
        .ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match url.query_pairs().find(|(key, _)| key == "v") {
            Some((_, v)) => Some(v.into_owned()),
            None => {
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("shorts") | Some("embed") | Some("live") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
        }
    } else {
        None
    };
    id.filter(|id| !id.is_empty() && id.chars().all(is_id_char))
}

/// Strip whitespace, comment lines and trailing comments. `None` for lines
/// with nothing left.
fn strip_comment(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.split_whitespace().next()?;
    let line = line.split('#').next()?;
    (!line.is_empty()).then_some(line)
}

/// Ids found in link-per-line text and the number of unrecognized lines.
pub fn parse_link_lines(text: &str) -> (Vec<String>, usize) {
    let mut ids = Vec::new();
    let mut malformed = 0;
    for entry in text.lines().filter_map(strip_comment) {
        match extract_id(entry) {
            Some(id) => ids.push(id),
            None => {
                tracing::debug!(entry, "unrecognized link");
                malformed += 1;
            }
        }
    }
    (ids, malformed)
}

/// Text file with one link per line.
#[derive(Debug, Clone)]
pub struct TextLinkFile {
    path: PathBuf,
}

impl TextLinkFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Resolver for TextLinkFile {
    fn resolve(&self) -> Result<Resolution, ResolveError> {
        let text = read(&self.path)?;
        let (ids, malformed) = parse_link_lines(&text);
        Ok(Resolution::from_ids(ids, malformed))
    }
}

/// Ids or links given directly (command line arguments).
#[derive(Debug, Clone, Default)]
pub struct IdList {
    items: Vec<String>,
}

impl IdList {
    pub fn new(items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Resolver for IdList {
    fn resolve(&self) -> Result<Resolution, ResolveError> {
        let mut ids = Vec::new();
        let mut malformed = 0;
        for item in &self.items {
            match extract_id(item) {
                Some(id) => ids.push(id),
                None => malformed += 1,
            }
        }
        Ok(Resolution::from_ids(ids, malformed))
    }
}
