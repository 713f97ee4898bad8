//! Reading curated slug sequences from disk.
//!
//! Two formats are accepted:
//!
//! - TOML (`*.toml`): `slugs = ["restaurants", "shopping"]`
//! - plain text (anything else): one slug per line, `#` starts a comment

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderFileError {
    #[error("failed to read order file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("order file {path} is not valid TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("order file {0} lists no slugs")]
    Empty(PathBuf),
}

#[derive(Debug, Deserialize)]
struct TomlOrder {
    slugs: Vec<String>,
}

/// Load the slug sequence from `path`.
pub fn load_order_file(path: &Path) -> Result<Vec<String>, OrderFileError> {
    let contents = std::fs::read_to_string(path).map_err(|source| OrderFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let slugs = if is_toml {
        parse_toml(&contents).map_err(|source| OrderFileError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        parse_lines(&contents)
    };

    if slugs.is_empty() {
        return Err(OrderFileError::Empty(path.to_path_buf()));
    }
    log::debug!("loaded {} slug(s) from {}", slugs.len(), path.display());
    Ok(slugs)
}

pub fn parse_toml(contents: &str) -> Result<Vec<String>, toml::de::Error> {
    let order: TomlOrder = toml::from_str(contents)?;
    Ok(order
        .slugs
        .into_iter()
        .map(|s| s.trim().to_string())
        .collect())
}

pub fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
