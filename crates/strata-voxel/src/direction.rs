use strata_geom::V3i;

/// The six face-adjacent directions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    XPos,
    XNeg,
    YPos,
    YNeg,
    ZPos,
    ZNeg,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::XPos,
        Direction::XNeg,
        Direction::YPos,
        Direction::YNeg,
        Direction::ZPos,
        Direction::ZNeg,
    ];

    pub const HORIZONTAL: [Direction; 4] = [
        Direction::XPos,
        Direction::XNeg,
        Direction::ZPos,
        Direction::ZNeg,
    ];

    #[inline]
    pub fn offset(self) -> V3i {
        match self {
            Direction::XPos => V3i::new(1, 0, 0),
            Direction::XNeg => V3i::new(-1, 0, 0),
            Direction::YPos => V3i::new(0, 1, 0),
            Direction::YNeg => V3i::new(0, -1, 0),
            Direction::ZPos => V3i::new(0, 0, 1),
            Direction::ZNeg => V3i::new(0, 0, -1),
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::XPos => Direction::XNeg,
            Direction::XNeg => Direction::XPos,
            Direction::YPos => Direction::YNeg,
            Direction::YNeg => Direction::YPos,
            Direction::ZPos => Direction::ZNeg,
            Direction::ZNeg => Direction::ZPos,
        }
    }
}
