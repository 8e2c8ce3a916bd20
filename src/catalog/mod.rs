//! The remote NASA model catalogue: the full repository tree when the
//! GitHub API cooperates, a curated list when it does not.

use std::io::Read;

use serde::Deserialize;

pub const BASE_RAW: &str = "https://raw.githubusercontent.com/nasa/NASA-3D-Resources/master/";
const BRANCH_API: &str = "https://api.github.com/repos/nasa/NASA-3D-Resources/branches/master";
const TREE_API: &str = "https://api.github.com/repos/nasa/NASA-3D-Resources/git/trees/";

pub const SUPPORTED_EXTENSIONS: &[&str] = &["glb", "gltf", "fbx", "stl", "obj", "3ds"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub path: String,
}

impl CatalogEntry {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    /// Raw-content URL the importer downloads from.
    pub fn url(&self) -> String {
        format!("{BASE_RAW}{}", self.path)
    }

    /// Name without its file extension, for card labels.
    pub fn display_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) if dot > 0 => &self.name[..dot],
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    All,
    Spacecraft,
    Rovers,
    Stations,
    Telescopes,
}

impl Category {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::All => &[],
            Category::Spacecraft => &[
                "shuttle",
                "voyager",
                "cassini",
                "dawn",
                "juno",
                "pioneer",
                "new_hor",
                "new hor",
                "maven",
                "orbiter",
                "spacecraft",
                "probe",
            ],
            Category::Rovers => &[
                "rover",
                "curiosity",
                "msl",
                "opportunity",
                "spirit",
                "perseverance",
            ],
            Category::Stations => &["station", "iss", "gateway"],
            Category::Telescopes => &["hubble", "telescope", "webb"],
        }
    }

    pub fn matches(self, name: &str) -> bool {
        let keywords = self.keywords();
        if keywords.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        keywords.iter().any(|keyword| name.contains(keyword))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Remote { truncated: bool },
    Curated,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub source: CatalogSource,
}

impl Catalog {
    /// The hand-picked fallback shown when the tree API is unreachable.
    pub fn curated() -> Self {
        let entries = CURATED
            .iter()
            .map(|(name, path)| CatalogEntry::new(name, path))
            .collect();
        Self {
            entries,
            source: CatalogSource::Curated,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status line to surface after a fetch, when there is something worth
    /// saying.
    pub fn status_note(&self) -> Option<String> {
        match self.source {
            CatalogSource::Remote { truncated: true } => {
                Some(format!("{} models (truncated)", self.len()))
            }
            CatalogSource::Remote { truncated: false } => None,
            CatalogSource::Curated => Some("Showing curated list".to_string()),
        }
    }

    /// Case-insensitive search within a category.
    pub fn filter(&self, query: &str, category: Category) -> Vec<&CatalogEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| {
                if !category.matches(&entry.name) {
                    return false;
                }
                query.is_empty() || entry.name.to_lowercase().contains(&query)
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("transfer failed: {0}")]
    Transport(String),
    #[error("unexpected API payload: {0}")]
    Payload(String),
    #[error("no models in repository tree")]
    Empty,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    tree: TreeRef,
}

#[derive(Deserialize)]
struct TreeRef {
    sha: String,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T, CatalogError> {
    let response = ureq::get(url)
        .set("Accept", "application/vnd.github+json")
        .call()
        .map_err(|err| CatalogError::Transport(err.to_string()))?;
    // The recursive tree payload can run past ureq's into_string cap.
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|err| CatalogError::Transport(err.to_string()))?;
    serde_json::from_slice(&body).map_err(|err| CatalogError::Payload(err.to_string()))
}

fn has_supported_extension(path: &str) -> bool {
    let path = path.to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(&format!(".{extension}")))
}

/// Walk the repository tree and keep every blob with a supported model
/// extension.
pub fn fetch_remote() -> Result<Catalog, CatalogError> {
    let branch: BranchResponse = get_json(BRANCH_API)?;
    let tree_url = format!("{TREE_API}{}?recursive=1", branch.commit.commit.tree.sha);
    let tree: TreeResponse = get_json(&tree_url)?;
    let truncated = tree.truncated;
    let entries: Vec<CatalogEntry> = tree
        .tree
        .into_iter()
        .filter(|item| item.kind == "blob" && has_supported_extension(&item.path))
        .map(|item| {
            let name = item
                .path
                .rsplit('/')
                .next()
                .unwrap_or(item.path.as_str())
                .to_string();
            CatalogEntry {
                name,
                path: item.path,
            }
        })
        .collect();
    if entries.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(Catalog {
        entries,
        source: CatalogSource::Remote { truncated },
    })
}

/// Remote tree with curated fallback; never fails.
pub fn fetch() -> Catalog {
    match fetch_remote() {
        Ok(catalog) => {
            log::info!("catalogue: {} models", catalog.len());
            catalog
        }
        Err(err) => {
            log::warn!("catalogue fetch failed, showing curated list: {err}");
            Catalog::curated()
        }
    }
}

const CURATED: [(&str, &str); 12] = [
    ("Curiosity Rover", "Models/Curiosity/MSL_Rover.STL"),
    (
        "Hubble Space Telescope",
        "Models/Hubble_Space_Telescope/hubble_space_telescope_2002.3ds",
    ),
    (
        "Mars Pathfinder Lander",
        "Models/Mars_Pathfinder_Lander/mars_pathfinder_lander.3ds",
    ),
    ("Voyager Spacecraft", "Models/Voyager/voyager.3ds"),
    ("Cassini", "Models/Cassini/cassini.3ds"),
    ("New Horizons", "Models/New_Horizons/new_horizons.3ds"),
    ("Dawn Spacecraft", "Models/Dawn/dawn.3ds"),
    ("Space Shuttle", "Models/Space_Shuttle/space_shuttle.3ds"),
    (
        "Apollo 11 Command Module",
        "Models/Apollo_11_Command_Module/command_module.3ds",
    ),
    (
        "Mars Reconnaissance Orbiter",
        "Models/Mars_Reconnaissance_Orbiter/mars_reconnaissance_orbiter.3ds",
    ),
    ("MAVEN", "Models/MAVEN/maven.3ds"),
    ("Juno", "Models/Juno/juno.3ds"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_list_is_complete() {
        let catalog = Catalog::curated();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.source, CatalogSource::Curated);
        assert!(catalog.entries[0]
            .url()
            .starts_with("https://raw.githubusercontent.com/"));
    }

    #[test]
    fn category_filter_uses_keywords() {
        let catalog = Catalog::curated();
        let rovers = catalog.filter("", Category::Rovers);
        assert_eq!(rovers.len(), 1);
        assert_eq!(rovers[0].name, "Curiosity Rover");

        let telescopes = catalog.filter("", Category::Telescopes);
        assert_eq!(telescopes.len(), 1);
        assert!(telescopes[0].name.contains("Hubble"));
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = Catalog::curated();
        let hits = catalog.filter("VOYAGER", Category::All);
        assert_eq!(hits.len(), 1);
        assert!(catalog.filter("voyager", Category::Rovers).is_empty());
    }

    #[test]
    fn extension_filter_matches_any_case() {
        assert!(has_supported_extension("Models/Curiosity/MSL_Rover.STL"));
        assert!(has_supported_extension("models/thing.glb"));
        assert!(!has_supported_extension("README.md"));
    }

    #[test]
    fn status_note_reflects_the_source() {
        let curated = Catalog::curated();
        assert_eq!(curated.status_note().as_deref(), Some("Showing curated list"));
        let remote = Catalog {
            entries: curated.entries.clone(),
            source: CatalogSource::Remote { truncated: false },
        };
        assert_eq!(remote.status_note(), None);
    }

    #[test]
    fn display_name_strips_extension() {
        let entry = CatalogEntry::new("voyager.3ds", "Models/Voyager/voyager.3ds");
        assert_eq!(entry.display_name(), "voyager");
    }
}
