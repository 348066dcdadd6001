use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

// Day identity is positional: numbers stay dense and contiguous across
// the live collection, so the 1-based number doubles as the key the
// backend is addressed by.
id_newtype!(DayNumber, u32);
id_newtype!(AttractionId, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionKind {
    Hotel,
    Restaurant,
    Activity,
}

impl AttractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttractionKind::Hotel => "hotel",
            AttractionKind::Restaurant => "restaurant",
            AttractionKind::Activity => "activity",
        }
    }
}

impl std::str::FromStr for AttractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotel" => Ok(AttractionKind::Hotel),
            "restaurant" => Ok(AttractionKind::Restaurant),
            "activity" => Ok(AttractionKind::Activity),
            other => Err(format!("unknown attraction kind: {other}")),
        }
    }
}
