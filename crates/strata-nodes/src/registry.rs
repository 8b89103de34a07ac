use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{DrawType, LiquidKind, NodeDef, NodesConfig};
use super::node::{CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN, ContentId, LIGHT_MAX};

/// Node set used by the built-in map generators.
pub const MAPGEN_NODES_TOML: &str = include_str!("../assets/mapgen_nodes.toml");

#[derive(Debug, thiserror::Error)]
pub enum NodeConfigError {
    #[error("node '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("node '{name}' requests reserved content id {id}")]
    ReservedId { name: String, id: ContentId },
    #[error("node '{name}' requests content id {id}, already used by '{existing}'")]
    IdTaken {
        name: String,
        id: ContentId,
        existing: String,
    },
    #[error("node '{name}' names unknown liquid alternative '{alternative}'")]
    UnknownAlternative { name: String, alternative: String },
    #[error("content id space exhausted while registering '{0}'")]
    IdsExhausted(String),
}

/// Properties the generators and lighting consult per content id.
#[derive(Clone, Debug)]
pub struct ContentFeatures {
    pub name: String,
    pub drawtype: DrawType,
    pub walkable: bool,
    pub light_propagates: bool,
    pub sunlight_propagates: bool,
    pub light_source: u8,
    pub liquid: LiquidKind,
    pub liquid_alternative_flowing: ContentId,
    pub liquid_alternative_source: ContentId,
    pub is_ground_content: bool,
    pub buildable_to: bool,
    /// Liquids may flow into this node and replace it.
    pub floodable: bool,
    pub groups: HashMap<String, i32>,
}

impl ContentFeatures {
    fn builtin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            drawtype: DrawType::Normal,
            walkable: true,
            light_propagates: false,
            sunlight_propagates: false,
            light_source: 0,
            liquid: LiquidKind::None,
            liquid_alternative_flowing: CONTENT_IGNORE,
            liquid_alternative_source: CONTENT_IGNORE,
            is_ground_content: false,
            buildable_to: false,
            floodable: false,
            groups: HashMap::new(),
        }
    }

    fn air() -> Self {
        Self {
            drawtype: DrawType::Airlike,
            walkable: false,
            light_propagates: true,
            sunlight_propagates: true,
            buildable_to: true,
            floodable: true,
            ..Self::builtin("air")
        }
    }

    fn ignore() -> Self {
        Self {
            drawtype: DrawType::Airlike,
            walkable: false,
            buildable_to: true,
            ..Self::builtin("ignore")
        }
    }

    #[inline]
    pub fn is_cube(&self) -> bool {
        self.drawtype == DrawType::Normal
    }

    #[inline]
    pub fn is_liquid(&self) -> bool {
        self.liquid != LiquidKind::None
    }

    pub fn group(&self, name: &str) -> i32 {
        self.groups.get(name).copied().unwrap_or(0)
    }
}

/// Content id → features table with name lookup.
///
/// Ids 125..=127 are always present as `unknown`, `air` and `ignore`.
#[derive(Clone, Debug)]
pub struct NodeRegistry {
    features: Vec<ContentFeatures>,
    by_name: HashMap<String, ContentId>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            features: Vec::new(),
            by_name: HashMap::new(),
        };
        reg.put(CONTENT_UNKNOWN, ContentFeatures::builtin("unknown"));
        reg.put(CONTENT_AIR, ContentFeatures::air());
        reg.put(CONTENT_IGNORE, ContentFeatures::ignore());
        reg
    }

    fn put(&mut self, id: ContentId, f: ContentFeatures) {
        let idx = id as usize;
        if self.features.len() <= idx {
            self.features
                .resize_with(idx + 1, || ContentFeatures::builtin(""));
        }
        self.by_name.insert(f.name.clone(), id);
        self.features[idx] = f;
    }

    fn is_reserved(id: ContentId) -> bool {
        (CONTENT_UNKNOWN..=CONTENT_IGNORE).contains(&id)
    }

    fn is_free(&self, id: ContentId) -> bool {
        self.features
            .get(id as usize)
            .is_none_or(|f| f.name.is_empty())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: NodesConfig = toml::from_str(toml_str)?;
        Ok(Self::from_config(cfg)?)
    }

    /// Registry holding the node set the built-in generators refer to.
    pub fn mapgen_defaults() -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(MAPGEN_NODES_TOML)
    }

    pub fn from_config(cfg: NodesConfig) -> Result<Self, NodeConfigError> {
        let mut reg = NodeRegistry::new();
        let mut next_free: u32 = 0;
        let mut pending_alts: Vec<(ContentId, Option<String>, Option<String>)> = Vec::new();

        for def in cfg.nodes.into_iter() {
            if reg.by_name.contains_key(&def.name) {
                return Err(NodeConfigError::DuplicateName(def.name));
            }
            let id = match def.id {
                Some(id) if Self::is_reserved(id) => {
                    return Err(NodeConfigError::ReservedId { name: def.name, id });
                }
                Some(id) if !reg.is_free(id) => {
                    return Err(NodeConfigError::IdTaken {
                        existing: reg.features[id as usize].name.clone(),
                        name: def.name,
                        id,
                    });
                }
                Some(id) => id,
                None => {
                    while next_free <= u32::from(u16::MAX)
                        && (Self::is_reserved(next_free as u16) || !reg.is_free(next_free as u16))
                    {
                        next_free += 1;
                    }
                    if next_free > u32::from(u16::MAX) {
                        return Err(NodeConfigError::IdsExhausted(def.name));
                    }
                    next_free as u16
                }
            };
            pending_alts.push((
                id,
                def.liquid_alternative_flowing.clone(),
                def.liquid_alternative_source.clone(),
            ));
            let features = compile_def(def);
            reg.put(id, features);
        }

        // Alternatives may refer to nodes defined later in the file.
        for (id, flowing, source) in pending_alts {
            let resolve = |reg: &NodeRegistry, alt: Option<String>| -> Result<ContentId, NodeConfigError> {
                match alt {
                    None => Ok(CONTENT_IGNORE),
                    Some(a) => reg.id_of(&a).ok_or_else(|| NodeConfigError::UnknownAlternative {
                        name: reg.features[id as usize].name.clone(),
                        alternative: a,
                    }),
                }
            };
            let flowing = resolve(&reg, flowing)?;
            let source = resolve(&reg, source)?;
            let f = &mut reg.features[id as usize];
            f.liquid_alternative_flowing = flowing;
            f.liquid_alternative_source = source;
            if f.liquid == LiquidKind::Source && f.liquid_alternative_source == CONTENT_IGNORE {
                f.liquid_alternative_source = id;
            }
        }

        log::debug!(target: "nodes", "registered {} node kinds", reg.by_name.len());
        Ok(reg)
    }

    pub fn id_of(&self, name: &str) -> Option<ContentId> {
        self.by_name.get(name).copied()
    }

    /// Features for `id`; unregistered ids resolve to the `unknown` entry.
    #[inline]
    pub fn features_of(&self, id: ContentId) -> &ContentFeatures {
        match self.features.get(id as usize) {
            Some(f) if !f.name.is_empty() => f,
            _ => &self.features[CONTENT_UNKNOWN as usize],
        }
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentFeatures> {
        self.features
            .get(id as usize)
            .filter(|f| !f.name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, ContentId)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn compile_def(def: NodeDef) -> ContentFeatures {
    let drawtype = def.drawtype.unwrap_or_default();
    let liquid = def.liquid.unwrap_or(match drawtype {
        DrawType::Liquid => LiquidKind::Source,
        DrawType::FlowingLiquid => LiquidKind::Flowing,
        _ => LiquidKind::None,
    });
    let see_through = !matches!(drawtype, DrawType::Normal);
    let light_source = def.light_source.unwrap_or(0);
    if light_source > LIGHT_MAX {
        log::warn!(
            target: "nodes",
            "node '{}' light_source {} capped to {}",
            def.name,
            light_source,
            LIGHT_MAX
        );
    }
    ContentFeatures {
        walkable: def.walkable.unwrap_or(liquid == LiquidKind::None && drawtype != DrawType::Airlike),
        light_propagates: def.light_propagates.unwrap_or(see_through),
        sunlight_propagates: def
            .sunlight_propagates
            .unwrap_or(matches!(drawtype, DrawType::Airlike | DrawType::Glasslike)),
        light_source: light_source.min(LIGHT_MAX),
        liquid,
        liquid_alternative_flowing: CONTENT_IGNORE,
        liquid_alternative_source: CONTENT_IGNORE,
        is_ground_content: def.is_ground_content.unwrap_or(false),
        buildable_to: def.buildable_to.unwrap_or(drawtype == DrawType::Airlike),
        floodable: def.floodable.unwrap_or(drawtype == DrawType::Airlike),
        groups: def.groups.unwrap_or_default(),
        drawtype,
        name: def.name,
    }
}
