use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
}

pub const AIR_NAME: &str = "air";

/// One `[[block]]` entry of a registry file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    #[serde(default)]
    pub order: String,
    pub is_transparent: bool,
    pub is_meshable: bool,
    pub color: [f32; 3],
}

impl BlockDefinition {
    pub fn new(
        name: &str,
        order: &str,
        is_transparent: bool,
        is_meshable: bool,
        color: [f32; 3],
    ) -> Self {
        Self {
            name: name.to_string(),
            order: order.to_string(),
            is_transparent,
            is_meshable,
            color,
        }
    }

    fn air() -> Self {
        Self::new(AIR_NAME, "", true, false, [0.0, 0.0, 0.0])
    }

    /// Whether a face of a neighbouring block touching this one is visible.
    pub fn exposes_neighbour(&self) -> bool {
        self.is_transparent || !self.is_meshable
    }
}

#[derive(Debug, Deserialize)]
struct RegistryManifest {
    #[serde(rename = "block", default)]
    blocks: Vec<BlockDefinition>,
}

/// Block definitions keyed by dense ids. Id 0 is always air.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Ids are assigned in `(order, name)` order after air.
    pub fn from_definitions(mut definitions: Vec<BlockDefinition>) -> Result<Self, String> {
        let air = match definitions.iter().position(|def| def.name == AIR_NAME) {
            Some(index) => definitions.swap_remove(index),
            None => BlockDefinition::air(),
        };
        definitions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        definitions.insert(0, air);

        if definitions.len() > usize::from(u16::MAX) + 1 {
            return Err(format!(
                "block registry holds {} entries; at most {} fit a BlockId",
                definitions.len(),
                usize::from(u16::MAX) + 1
            ));
        }

        let mut by_name = HashMap::with_capacity(definitions.len());
        for (index, def) in definitions.iter().enumerate() {
            if def.name.is_empty() {
                return Err(format!("block #{index} has an empty name"));
            }
            if by_name.insert(def.name.clone(), BlockId(index as u16)).is_some() {
                return Err(format!("block '{}' registered twice", def.name));
            }
        }

        Ok(Self {
            definitions,
            by_name,
        })
    }

    fn air_only() -> Self {
        let air = BlockDefinition::air();
        let by_name = HashMap::from([(air.name.clone(), BlockId::AIR)]);
        Self {
            definitions: vec![air],
            by_name,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, String> {
        let manifest: RegistryManifest =
            toml::from_str(source).map_err(|err| format!("failed to parse block registry: {err}"))?;
        Self::from_definitions(manifest.blocks)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        let registry =
            Self::from_toml_str(&source).map_err(|err| format!("{}: {err}", path.display()))?;
        info!(
            "Loaded {} block definitions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Unknown ids resolve to air.
    pub fn get(&self, id: BlockId) -> &BlockDefinition {
        self.definitions
            .get(usize::from(id.0))
            .unwrap_or(&self.definitions[0])
    }

    pub fn get_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn is_meshable(&self, id: BlockId) -> bool {
        self.get(id).is_meshable
    }

    pub fn is_transparent(&self, id: BlockId) -> bool {
        self.get(id).is_transparent
    }

    pub fn base_color(&self, id: BlockId) -> Vec3 {
        Vec3::from_array(self.get(id).color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, def)| (BlockId(index as u16), def))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        default_registry()
    }
}

pub fn default_registry() -> BlockRegistry {
    let definitions = vec![
        BlockDefinition::new("stone", "a", false, true, [0.5, 0.5, 0.52]),
        BlockDefinition::new("dirt", "b", false, true, [0.45, 0.3, 0.18]),
        BlockDefinition::new("grass", "c", false, true, [0.3, 0.62, 0.22]),
        BlockDefinition::new("sand", "d", false, true, [0.86, 0.8, 0.56]),
        BlockDefinition::new("leaves", "e", true, true, [0.2, 0.5, 0.18]),
        BlockDefinition::new("glass", "f", true, true, [0.8, 0.9, 0.95]),
        BlockDefinition::new("water", "g", true, true, [0.18, 0.36, 0.8]),
        BlockDefinition::new("barrier", "h", true, false, [0.0, 0.0, 0.0]),
    ];
    let registry = BlockRegistry::from_definitions(definitions).unwrap_or_else(|err| {
        warn!("Default block registry rejected ({err}); falling back to air only");
        BlockRegistry::air_only()
    });
    debug!("Built default block registry with {} entries", registry.len());
    registry
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{default_registry, BlockDefinition, BlockId, BlockRegistry};

    const SAMPLE: &str = r#"
        [[block]]
        name = "marble"
        order = "b"
        is_transparent = false
        is_meshable = true
        color = [0.9, 0.9, 0.9]

        [[block]]
        name = "basalt"
        order = "a"
        is_transparent = false
        is_meshable = true
        color = [0.2, 0.2, 0.22]

        [[block]]
        name = "mist"
        order = "a"
        is_transparent = true
        is_meshable = false
        color = [1.0, 1.0, 1.0]
    "#;

    #[test]
    fn toml_registry_sorts_by_order_then_name() {
        let registry = BlockRegistry::from_toml_str(SAMPLE).expect("sample registry parses");
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(BlockId::AIR).name, "air");
        assert_eq!(registry.get_by_name("basalt"), Some(BlockId(1)));
        assert_eq!(registry.get_by_name("mist"), Some(BlockId(2)));
        assert_eq!(registry.get_by_name("marble"), Some(BlockId(3)));
        assert!(!registry.is_meshable(BlockId(2)));
        assert!(registry.is_transparent(BlockId(2)));
        assert_eq!(registry.base_color(BlockId(3)), Vec3::splat(0.9));
    }

    #[test]
    fn declared_air_keeps_id_zero() {
        let registry = BlockRegistry::from_definitions(vec![
            BlockDefinition::new("rock", "0", false, true, [0.5; 3]),
            BlockDefinition::new("air", "z", true, false, [0.0; 3]),
        ])
        .expect("registry builds");
        assert_eq!(registry.get_by_name("air"), Some(BlockId::AIR));
        assert_eq!(registry.get_by_name("rock"), Some(BlockId(1)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = BlockRegistry::from_definitions(vec![
            BlockDefinition::new("rock", "a", false, true, [0.5; 3]),
            BlockDefinition::new("rock", "b", false, true, [0.4; 3]),
        ])
        .unwrap_err();
        assert!(err.contains("rock"), "{err}");
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = BlockRegistry::from_toml_str("[[block]]\nname = 3").unwrap_err();
        assert!(err.starts_with("failed to parse block registry"), "{err}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BlockRegistry::load("/nonexistent/blocks.toml").unwrap_err();
        assert!(err.contains("/nonexistent/blocks.toml"), "{err}");
    }

    #[test]
    fn shipped_registry_matches_builtin_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/blocks.toml");
        let shipped = BlockRegistry::load(path).expect("assets/blocks.toml loads");
        let builtin = default_registry();
        assert_eq!(shipped.len(), builtin.len());
        for (id, def) in builtin.iter() {
            assert_eq!(shipped.get(id), def);
        }
    }

    #[test]
    fn air_only_registry_still_resolves_air() {
        let registry = BlockRegistry::air_only();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_by_name("air"), Some(BlockId::AIR));
        assert!(!registry.is_meshable(BlockId(3)));
    }

    #[test]
    fn unknown_ids_fall_back_to_air() {
        let registry = default_registry();
        assert_eq!(registry.get(BlockId(u16::MAX)).name, "air");
        assert!(!registry.is_meshable(BlockId(u16::MAX)));
    }

    #[test]
    fn default_registry_assigns_ids_by_order() {
        let registry = default_registry();
        assert_eq!(registry.len(), 9);
        let names: Vec<&str> = registry.iter().map(|(_, def)| def.name.as_str()).collect();
        assert_eq!(
            names,
            ["air", "stone", "dirt", "grass", "sand", "leaves", "glass", "water", "barrier"]
        );
        assert_eq!(registry.get_by_name("barrier"), Some(BlockId(8)));
        assert!(registry.get(registry.get_by_name("water").unwrap()).exposes_neighbour());
        assert!(!registry.get(registry.get_by_name("stone").unwrap()).exposes_neighbour());
    }
}
