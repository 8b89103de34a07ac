use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use strata_emerge::EmergeConfig;
use strata_mapgen::MapgenConfig;
use strata_nodes::{NodeDef, NodeRegistry, NodesConfig};

/// Root config file: `[[nodes]]`, `[mapgen]` and `[emerge]`.
#[derive(Clone, Debug, Deserialize)]
pub struct StrataConfig {
    /// Empty means the built-in mapgen node set.
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub mapgen: MapgenConfig,
    #[serde(default)]
    pub emerge: EmergeConfig,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            mapgen: MapgenConfig::default(),
            emerge: EmergeConfig::default(),
        }
    }
}

impl StrataConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(s)?)
    }

    pub fn registry(&self) -> Result<NodeRegistry, Box<dyn Error>> {
        if self.nodes.is_empty() {
            return NodeRegistry::mapgen_defaults();
        }
        Ok(NodeRegistry::from_config(NodesConfig {
            nodes: self.nodes.clone(),
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_mapgen::{MapgenName, MapgenParams};

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = StrataConfig::from_toml_str("").unwrap();
        assert!(cfg.nodes.is_empty());
        assert_eq!(cfg.emerge.num_threads, 0);
        let reg = cfg.registry().unwrap();
        assert!(reg.id_of("mapgen_stone").is_some());
    }

    #[test]
    fn bundled_config_parses() {
        let cfg = StrataConfig::from_toml_str(include_str!("../assets/strata.toml")).unwrap();
        let params = MapgenParams::from_config(&cfg.mapgen);
        assert_eq!(params.name, MapgenName::V7);
        assert_eq!(params.seed, 42);
        assert_eq!(params.layers.layers.len(), 2);
        assert_eq!(params.layers.thickness_of(&params.layers.layers[0]), 2);
        assert!(params.v6.mudflow);
        assert_eq!(cfg.emerge.num_threads, 2);
    }

    #[test]
    fn custom_node_list_replaces_defaults() {
        let cfg = StrataConfig::from_toml_str(
            r#"
            [[nodes]]
            name = "rock"

            [mapgen]
            mg_name = "singlenode"
            "#,
        )
        .unwrap();
        let reg = cfg.registry().unwrap();
        assert!(reg.id_of("rock").is_some());
        assert!(reg.id_of("mapgen_stone").is_none());
        assert_eq!(cfg.mapgen.mg_name, MapgenName::Singlenode);
    }
}
