use std::collections::HashMap;

use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NodesConfig {
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NodeDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub drawtype: Option<DrawType>,
    #[serde(default)]
    pub walkable: Option<bool>,
    #[serde(default)]
    pub light_propagates: Option<bool>,
    #[serde(default)]
    pub sunlight_propagates: Option<bool>,
    #[serde(default)]
    pub light_source: Option<u8>,
    #[serde(default)]
    pub liquid: Option<LiquidKind>,
    #[serde(default)]
    pub liquid_alternative_flowing: Option<String>,
    #[serde(default)]
    pub liquid_alternative_source: Option<String>,
    #[serde(default)]
    pub is_ground_content: Option<bool>,
    #[serde(default)]
    pub buildable_to: Option<bool>,
    #[serde(default)]
    pub floodable: Option<bool>,
    #[serde(default)]
    pub groups: Option<HashMap<String, i32>>,
}

impl NodeDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            drawtype: None,
            walkable: None,
            light_propagates: None,
            sunlight_propagates: None,
            light_source: None,
            liquid: None,
            liquid_alternative_flowing: None,
            liquid_alternative_source: None,
            is_ground_content: None,
            buildable_to: None,
            floodable: None,
            groups: None,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DrawType {
    #[default]
    Normal,
    Airlike,
    Liquid,
    FlowingLiquid,
    Glasslike,
    Nodebox,
    Plantlike,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LiquidKind {
    #[default]
    None,
    Source,
    Flowing,
}
