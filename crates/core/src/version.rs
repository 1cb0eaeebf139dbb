//! Version classification for directory files.
//!
//! Reference documents carry their revision in the file name:
//!
//! | Marker | Meaning | Example |
//! |--------|---------|---------|
//! | `V` | released | `norm_V1.2.pdf` |
//! | `X` | draft | `norm_X0.5.pdf` |
//!
//! The marker must start the name or follow `_`, `-` or a space, and the
//! revision must end the name or be followed by a non-alphanumeric character.
//! Classification never fails: anything that does not parse is unversioned.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[_\-\s])([VX])(\d+(?:\.\d+){0,2})").ok());

static MARKER_STRIP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)[_\-\s][VX]\d+(?:\.\d+){0,2}").ok());

static SEPARATOR_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[_\-]{2,}").ok());

/// The kind of revision marker found on a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionType {
    /// `V`: a released revision.
    Released,
    /// `X`: a draft revision.
    Draft,
    /// Any other tag reported by the backend. Never released.
    Other(String),
}

impl VersionType {
    /// Only `V` revisions are released.
    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Released => "V",
            Self::Draft => "X",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for VersionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "V" | "v" => Self::Released,
            "X" | "x" => Self::Draft,
            _ => Self::Other(tag),
        }
    }
}

impl From<VersionType> for String {
    fn from(kind: VersionType) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for VersionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one file identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Revision as written in the name, e.g. `"1.2"`. `None` means unversioned.
    pub version: Option<String>,
    pub version_type: Option<VersionType>,
    pub is_released: bool,
}

impl VersionInfo {
    pub fn unversioned() -> Self {
        Self::default()
    }

    fn marked(version_type: VersionType, version: &str) -> Self {
        Self {
            version: Some(version.to_string()),
            is_released: version_type.is_released(),
            version_type: Some(version_type),
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// Numeric revision for ordering, if versioned.
    pub fn revision(&self) -> Option<Revision> {
        self.version.as_deref().map(Revision::parse)
    }
}

/// A `major.minor.patch` revision; missing parts count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Revision(pub u32, pub u32, pub u32);

impl Revision {
    /// Lenient parse: unparsable parts become zero.
    pub fn parse(version: &str) -> Self {
        let mut parts = version
            .split('.')
            .map(|p| p.trim().parse::<u32>().unwrap_or(0));
        Self(
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
        )
    }
}

/// Parses revision markers out of file names.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionClassifier;

impl VersionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a path or file name.
    ///
    /// When both a `V` and an `X` marker are present the released one wins.
    pub fn classify(&self, raw: &str) -> VersionInfo {
        let name = file_name(raw);
        let Some(re) = MARKER.as_ref() else {
            return VersionInfo::unversioned();
        };

        let mut released: Option<&str> = None;
        let mut draft: Option<&str> = None;

        for caps in re.captures_iter(name) {
            let (Some(kind), Some(rev)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let terminated = name[rev.end()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_ascii_alphanumeric());
            if !terminated {
                continue;
            }
            if kind.as_str().eq_ignore_ascii_case("v") {
                released.get_or_insert(rev.as_str());
            } else {
                draft.get_or_insert(rev.as_str());
            }
        }

        match (released, draft) {
            (Some(v), _) => VersionInfo::marked(VersionType::Released, v),
            (None, Some(x)) => VersionInfo::marked(VersionType::Draft, x),
            (None, None) => VersionInfo::unversioned(),
        }
    }

    /// Strip revision markers from a file name, keeping the extension.
    ///
    /// `manual_V1.2.pdf` and `manual_X0.5.pdf` both yield `manual.pdf`.
    pub fn base_name(&self, raw: &str) -> String {
        let name = file_name(raw);
        let (stem, ext) = split_extension(name);

        let mut base = match MARKER_STRIP.as_ref() {
            Some(re) => re.replace_all(stem, "").into_owned(),
            None => stem.to_string(),
        };
        if let Some(re) = SEPARATOR_RUN.as_ref() {
            base = re.replace_all(&base, "_").into_owned();
        }
        let base = base.trim_matches(|c| c == '_' || c == '-');

        format!("{base}{ext}")
    }

    /// Keep only the newest revision of each document.
    ///
    /// Files are grouped by [`base_name`](Self::base_name). Per group the
    /// highest `V` revision is kept if one exists, else the highest `X`
    /// revision, else every unversioned file. Groups keep the order in which
    /// they first appear.
    pub fn select_latest_versions<S: AsRef<str>>(&self, files: &[S]) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<(&str, VersionInfo)>> = HashMap::new();

        for file in files {
            let file = file.as_ref();
            let base = self.base_name(file);
            if !groups.contains_key(&base) {
                order.push(base.clone());
            }
            groups
                .entry(base)
                .or_default()
                .push((file, self.classify(file)));
        }

        let mut selected = Vec::new();
        for base in &order {
            let Some(members) = groups.get(base) else {
                continue;
            };
            let newest = |released: bool| {
                members
                    .iter()
                    .filter(|(_, info)| info.is_versioned() && info.is_released == released)
                    .max_by_key(|(_, info)| info.revision())
                    .map(|(path, _)| path.to_string())
            };

            if let Some(path) = newest(true).or_else(|| newest(false)) {
                debug!(base = %base, selected = %path, "Selected latest revision");
                selected.push(path);
            } else {
                selected.extend(
                    members
                        .iter()
                        .filter(|(_, info)| !info.is_versioned())
                        .map(|(path, _)| path.to_string()),
                );
            }
        }

        debug!(total = files.len(), selected = selected.len(), "Version filtering");
        selected
    }
}

/// The last path component, accepting both separator styles.
fn file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Split `name.ext` into (`name`, `.ext`). Dots inside a trailing revision
/// (`doc_V1.2`) are not treated as an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &name[idx..];
            if ext[1..].chars().all(|c| c.is_ascii_digit()) {
                (name, "")
            } else {
                (&name[..idx], ext)
            }
        }
        _ => (name, ""),
    }
}
