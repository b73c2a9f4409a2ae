//! Decider tags (spec.md §6).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeciderTag {
    Cycler = 1,
    TranslatedCyclerRight = 2,
    TranslatedCyclerLeft = 3,
    BackwardReasoning = 4,
    HaltingSegment = 5,
    Bouncer = 6,
    FarDfaOnly = 7,
    FarDfaNfa = 8,
}

impl DeciderTag {
    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => DeciderTag::Cycler,
            2 => DeciderTag::TranslatedCyclerRight,
            3 => DeciderTag::TranslatedCyclerLeft,
            4 => DeciderTag::BackwardReasoning,
            5 => DeciderTag::HaltingSegment,
            6 => DeciderTag::Bouncer,
            7 => DeciderTag::FarDfaOnly,
            8 => DeciderTag::FarDfaNfa,
            _ => return None,
        })
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
