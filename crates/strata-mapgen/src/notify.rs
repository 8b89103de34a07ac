use strata_geom::V3i;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GenNotifyType {
    Dungeon,
    Temple,
    CaveBegin,
    CaveEnd,
    LargeCaveBegin,
    LargeCaveEnd,
    Decoration,
}

impl GenNotifyType {
    pub const ALL: [GenNotifyType; 7] = [
        GenNotifyType::Dungeon,
        GenNotifyType::Temple,
        GenNotifyType::CaveBegin,
        GenNotifyType::CaveEnd,
        GenNotifyType::LargeCaveBegin,
        GenNotifyType::LargeCaveEnd,
        GenNotifyType::Decoration,
    ];

    #[inline]
    pub fn bit(self) -> u32 {
        1 << self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenNotifyType::Dungeon => "dungeon",
            GenNotifyType::Temple => "temple",
            GenNotifyType::CaveBegin => "cave_begin",
            GenNotifyType::CaveEnd => "cave_end",
            GenNotifyType::LargeCaveBegin => "large_cave_begin",
            GenNotifyType::LargeCaveEnd => "large_cave_end",
            GenNotifyType::Decoration => "decoration",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GenNotifyEvent {
    pub kind: GenNotifyType,
    pub pos: V3i,
    /// Decoration id for `Decoration` events, 0 otherwise.
    pub id: u32,
}

/// Collects positions of notable generated features for the caller of a job.
#[derive(Clone, Debug)]
pub struct GenNotifier {
    notify_on: u32,
    deco_ids: Vec<u32>,
    events: Vec<GenNotifyEvent>,
}

impl Default for GenNotifier {
    fn default() -> Self {
        let all = GenNotifyType::ALL.iter().fold(0, |m, t| m | t.bit());
        Self::new(all)
    }
}

impl GenNotifier {
    pub fn new(notify_on: u32) -> Self {
        Self {
            notify_on,
            deco_ids: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Only decorations with one of these ids are reported; empty reports all.
    pub fn with_decoration_ids(mut self, ids: Vec<u32>) -> Self {
        self.deco_ids = ids;
        self
    }

    /// Records the event when its type is enabled. Returns whether it was kept.
    pub fn add_event(&mut self, kind: GenNotifyType, pos: V3i, id: u32) -> bool {
        if self.notify_on & kind.bit() == 0 {
            return false;
        }
        if kind == GenNotifyType::Decoration && !self.deco_ids.is_empty() && !self.deco_ids.contains(&id) {
            return false;
        }
        self.events.push(GenNotifyEvent { kind, pos, id });
        true
    }

    pub fn events(&self) -> &[GenNotifyEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<GenNotifyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, kind: GenNotifyType) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
