//! Season mapping from the month, with Portuguese labels.

/// Meteorological season, mapped from the month by fixed quarters:
/// March–May spring, June–August summer, September–November autumn,
/// December–February winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Primavera,
    Verao,
    Outono,
    Inverno,
}

impl Season {
    /// Display order used by the dashboard groupings.
    pub const ALL: [Season; 4] = [
        Season::Primavera,
        Season::Verao,
        Season::Outono,
        Season::Inverno,
    ];

    /// Season of a calendar month (1-12).
    pub fn from_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Primavera,
            6..=8 => Season::Verao,
            9..=11 => Season::Outono,
            _ => Season::Inverno,
        }
    }

    /// Portuguese label.
    pub fn label(&self) -> &'static str {
        match self {
            Season::Primavera => "Primavera",
            Season::Verao => "Verão",
            Season::Outono => "Outono",
            Season::Inverno => "Inverno",
        }
    }
}
