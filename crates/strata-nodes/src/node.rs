pub type ContentId = u16;

/// Content that is known to exist but has no registered definition.
pub const CONTENT_UNKNOWN: ContentId = 125;
pub const CONTENT_AIR: ContentId = 126;
/// "Nothing known here": never stored in finished map data.
pub const CONTENT_IGNORE: ContentId = 127;

/// Light level of direct sky exposure. Only sunlight may carry it.
pub const LIGHT_SUN: u8 = 15;
/// Brightest level an emitter may produce.
pub const LIGHT_MAX: u8 = 14;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LightBank {
    Day,
    Night,
}

impl LightBank {
    pub const BOTH: [LightBank; 2] = [LightBank::Day, LightBank::Night];
}

/// One voxel: content id plus two parameter bytes.
///
/// `param1` holds light: day bank in the low nibble, night bank in the high nibble.
/// `param2` depends on the content (facedir rotation, liquid level).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Node {
    pub content: ContentId,
    pub param1: u8,
    pub param2: u8,
}

impl Default for Node {
    fn default() -> Self {
        Node::IGNORE
    }
}

impl Node {
    pub const AIR: Node = Node::new(CONTENT_AIR);
    pub const IGNORE: Node = Node::new(CONTENT_IGNORE);

    #[inline]
    pub const fn new(content: ContentId) -> Self {
        Self {
            content,
            param1: 0,
            param2: 0,
        }
    }

    #[inline]
    pub const fn with_params(content: ContentId, param1: u8, param2: u8) -> Self {
        Self {
            content,
            param1,
            param2,
        }
    }

    #[inline]
    pub fn is_ignore(&self) -> bool {
        self.content == CONTENT_IGNORE
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.content == CONTENT_AIR
    }

    #[inline]
    pub fn light(&self, bank: LightBank) -> u8 {
        match bank {
            LightBank::Day => self.param1 & 0x0f,
            LightBank::Night => self.param1 >> 4,
        }
    }

    #[inline]
    pub fn set_light(&mut self, bank: LightBank, level: u8) {
        let level = level.min(LIGHT_SUN);
        match bank {
            LightBank::Day => self.param1 = (self.param1 & 0xf0) | level,
            LightBank::Night => self.param1 = (self.param1 & 0x0f) | (level << 4),
        }
    }

    /// Both banks set to `level`.
    #[inline]
    pub fn pack_light(level: u8) -> u8 {
        let l = level.min(LIGHT_SUN);
        l | (l << 4)
    }
}
