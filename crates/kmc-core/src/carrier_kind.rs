//! Carrier type tag shared by configuration, carriers, and output.

/// The species of quasi-particle being transported.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CarrierKind {
    #[default]
    Electron,
    Hole,
    /// Singlet exciton.
    Singlet,
    /// Triplet exciton.
    Triplet,
}

impl CarrierKind {
    /// `true` for neutral excitations (no drift in an electric field).
    #[inline]
    pub fn is_exciton(self) -> bool {
        matches!(self, CarrierKind::Singlet | CarrierKind::Triplet)
    }

    /// Short label used in CSV columns and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            CarrierKind::Electron => "e",
            CarrierKind::Hole     => "h",
            CarrierKind::Singlet  => "s",
            CarrierKind::Triplet  => "t",
        }
    }
}

impl std::fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CarrierKind {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "e" | "electron" => Ok(CarrierKind::Electron),
            "h" | "hole"     => Ok(CarrierKind::Hole),
            "s" | "singlet"  => Ok(CarrierKind::Singlet),
            "t" | "triplet"  => Ok(CarrierKind::Triplet),
            other => Err(crate::CoreError::Config(format!(
                "unknown carrier kind {other:?}: expected e, h, s or t"
            ))),
        }
    }
}
