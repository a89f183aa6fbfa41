//! Built-in chains and the command name catalog.
//!
//! Built-in chains are the "fixed" chains: always present in a store, never
//! renamed, deleted or edited, and restorable to the definitions kept here.
//!
//! | Chain          | Steps |
//! |----------------|-------|
//! | MP3 Conversion | Normalize → ExportMP3 |
//! | Fade Ends      | Select → FadeIn → Select → FadeOut → Select |

use crate::capabilities::CommandCatalog;
use crate::types::{Chain, Step};
use strum::{EnumIter, IntoEnumIterator};

/// Factory-provided chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum BuiltinChain {
    /// Normalize, then export as MP3.
    Mp3Conversion,
    /// Fade in the first second and fade out the last second.
    FadeEnds,
}

impl BuiltinChain {
    /// Reserved chain name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mp3Conversion => "MP3 Conversion",
            Self::FadeEnds => "Fade Ends",
        }
    }

    /// Default step list as (command, params) pairs.
    pub fn step_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Mp3Conversion => &[
                (
                    "Normalize",
                    "ApplyGain=yes RemoveDcOffset=yes Level=-1.0 StereoIndependent=no",
                ),
                ("ExportMP3", ""),
            ],
            Self::FadeEnds => &[
                ("Select", "Start=0 End=1"),
                ("FadeIn", ""),
                ("Select", "Start=-1 End=0 RelativeTo=ProjectEnd"),
                ("FadeOut", ""),
                ("Select", "Start=0 End=0"),
            ],
        }
    }

    /// Build the default chain.
    pub fn chain(self) -> Chain {
        let steps = self
            .step_table()
            .iter()
            .map(|(command, params)| Step::new(*command, *params))
            .collect();
        Chain::with_steps(self.name(), steps)
    }

    /// Look up a built-in by its reserved name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::iter().find(|b| b.name() == name)
    }
}

/// Returns true if `name` is reserved for a built-in chain.
pub fn is_builtin_name(name: &str) -> bool {
    BuiltinChain::from_name(name).is_some()
}

/// Known command identifiers and their display names.
pub const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("Amplify", "Amplify"),
    ("ChangePitch", "Change Pitch"),
    ("ChangeSpeed", "Change Speed"),
    ("ChangeTempo", "Change Tempo"),
    ("Compressor", "Compressor"),
    ("ExportFLAC", "Export as FLAC"),
    ("ExportMP3", "Export as MP3"),
    ("ExportOgg", "Export as Ogg"),
    ("ExportWAV", "Export as WAV"),
    ("FadeIn", "Fade In"),
    ("FadeOut", "Fade Out"),
    ("Invert", "Invert"),
    ("Normalize", "Normalize"),
    ("NoiseReduction", "Noise Reduction"),
    ("Reverse", "Reverse"),
    ("Select", "Select"),
    ("StereoToMono", "Stereo To Mono"),
    ("TruncateSilence", "Truncate Silence"),
];

/// Read-only catalog backed by [`BUILTIN_COMMANDS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl CommandCatalog for StaticCatalog {
    fn friendly_name(&self, command: &str) -> Option<String> {
        BUILTIN_COMMANDS
            .iter()
            .find(|(id, _)| *id == command)
            .map(|(_, friendly)| (*friendly).to_string())
    }

    fn commands(&self) -> Vec<(String, String)> {
        BUILTIN_COMMANDS
            .iter()
            .map(|(id, friendly)| ((*id).to_string(), (*friendly).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique_and_valid() {
        let names: Vec<&str> = BuiltinChain::iter().map(|b| b.name()).collect();
        for (i, name) in names.iter().enumerate() {
            assert!(!name.is_empty());
            assert!(!name.contains('/') && !name.contains('\\'));
            assert!(!names[i + 1..].contains(name), "duplicate built-in {}", name);
        }
    }

    #[test]
    fn test_from_name_round_trips() {
        for builtin in BuiltinChain::iter() {
            assert_eq!(BuiltinChain::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(BuiltinChain::from_name("mp3 conversion"), None);
    }

    #[test]
    fn test_default_chains_are_not_empty() {
        for builtin in BuiltinChain::iter() {
            let chain = builtin.chain();
            assert_eq!(chain.name, builtin.name());
            assert!(!chain.is_empty());
        }
    }

    #[test]
    fn test_builtin_steps_use_known_commands() {
        let catalog = StaticCatalog;
        for builtin in BuiltinChain::iter() {
            for (command, _) in builtin.step_table() {
                assert!(
                    catalog.friendly_name(command).is_some(),
                    "{} uses unknown command {}",
                    builtin.name(),
                    command
                );
            }
        }
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = StaticCatalog;
        assert_eq!(catalog.friendly_name("FadeIn").as_deref(), Some("Fade In"));
        assert_eq!(catalog.friendly_name("NoSuchCommand"), None);
        assert_eq!(catalog.display_name("NoSuchCommand"), "NoSuchCommand");
    }
}
