//! CLI configuration: defaults and the deployment file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use auction_types::AuctionAddress;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9944";
pub const DEFAULT_VAULT_PATH: &str = "auction-vault.json";
pub const DEFAULT_DEPLOYMENT_PATH: &str = "deployment.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No auction address given and no deployment file at {}; pass --auction or run create-auction", .0.display())]
    MissingAuction(PathBuf),

    #[error("Failed to access deployment file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid deployment file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where an auction lives, written by `create-auction`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub auction_address: AuctionAddress,
    pub rpc: String,
    pub created_at_height: u64,
}

impl Deployment {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), self).map_err(|err| io_err(err.into()))?;
        tmp.persist(path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// Auction to act on: the explicit address, else the deployment file's.
pub fn resolve_auction(
    explicit: Option<AuctionAddress>,
    deployment: &Path,
) -> Result<AuctionAddress, ConfigError> {
    if let Some(address) = explicit {
        return Ok(address);
    }
    match Deployment::load(deployment) {
        Ok(deployment) => Ok(deployment.auction_address),
        Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::MissingAuction(deployment.to_path_buf()))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deployment_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deployment.json");
        let deployment = Deployment {
            auction_address: AuctionAddress([3u8; 32]),
            rpc: DEFAULT_RPC_URL.to_string(),
            created_at_height: 4,
        };

        deployment.save(&path).unwrap();
        assert_eq!(Deployment::load(&path).unwrap(), deployment);
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let dir = TempDir::new().unwrap();
        let explicit = AuctionAddress([5u8; 32]);

        let resolved = resolve_auction(Some(explicit), &dir.path().join("missing.json")).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_resolve_from_deployment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deployment.json");
        let address = AuctionAddress([6u8; 32]);
        Deployment {
            auction_address: address,
            rpc: DEFAULT_RPC_URL.to_string(),
            created_at_height: 0,
        }
        .save(&path)
        .unwrap();

        assert_eq!(resolve_auction(None, &path).unwrap(), address);
    }

    #[test]
    fn test_resolve_missing() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            resolve_auction(None, &dir.path().join("deployment.json")),
            Err(ConfigError::MissingAuction(_))
        ));
    }
}
