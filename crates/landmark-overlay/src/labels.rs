//! Label resolution
//!
//! Feature names in the source data are long and formal ("Temple of
//! Olympian Zeus"); the map shows short labels ("Olympeion"). Labels
//! come from static dictionaries with a fallback chain through the
//! feature's own properties.

use crate::feature::Feature;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

const LANDMARK_LABELS: &[(&str, &str)] = &[
    ("Acropolis", "Acropolis"),
    ("Agora", "Agora"),
    ("Pnyx", "Pnyx"),
    ("Areopagus", "Areopagus"),
    ("Kerameikos", "Kerameikos"),
    ("Parthenon", "Parthenon"),
    ("Erechtheion", "Erechtheion"),
    ("Propylaea", "Propylaea"),
    ("Temple of Athena Nike", "Athena Nike"),
    ("Theatre of Dionysus", "Dionysus Theatre"),
    ("Odeon of Herodes Atticus", "Odeon"),
    ("Temple of Olympian Zeus", "Olympeion"),
    ("Roman Agora", "Roman Agora"),
    ("Tower of the Winds", "Tower of the Winds"),
    ("Hadrian's Library", "Hadrian's Library"),
    ("Panathenaic Stadium", "Kallimarmaro"),
    ("Temple of Hephaistos", "Hephaistos"),
    ("Stoa of Attalos", "Stoa of Attalos"),
    ("Tholos", "Tholos"),
    ("Bouleuterion", "Bouleuterion"),
    ("Altar of the Twelve Gods", "Altar of the XII Gods"),
    ("Sacred Way (Eleusis–Athens)", "Sacred Way"),
    ("Long Walls (Piraeus)", "Piraeus Long Wall"),
    ("Long Walls (Phaleron)", "Phaleron Long Wall"),
    ("City Wall of Athens", "City Wall"),
    ("Areopagus Viewpoint West", "Areopagus View"),
    ("Areopagus Viewpoint South", "Areopagus View"),
    ("Areopagus Viewpoint East", "Areopagus View"),
];

// Wall segments read better with their direction spelled out.
const LONG_WALL_LABELS: &[(&str, &str)] = &[
    ("Long Walls (Piraeus)", "Long Walls to Piraeus"),
    ("Long Walls (Phaleron)", "Long Walls to Phaleron"),
];

static LANDMARKS: LazyLock<Arc<LabelDictionary>> =
    LazyLock::new(|| Arc::new(LabelDictionary::from_entries(LANDMARK_LABELS.iter().copied())));

static LONG_WALLS: LazyLock<Arc<LabelDictionary>> =
    LazyLock::new(|| Arc::new(LabelDictionary::from_entries(LONG_WALL_LABELS.iter().copied())));

/// Immutable name → short label map
#[derive(Debug, Clone, Default)]
pub struct LabelDictionary {
    entries: HashMap<String, String>,
}

impl LabelDictionary {
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, label)| (name.into(), label.into()))
                .collect(),
        }
    }

    /// General landmark labels
    pub fn landmarks() -> Arc<LabelDictionary> {
        Arc::clone(&LANDMARKS)
    }

    /// Overrides applied to line features only
    pub fn long_walls() -> Arc<LabelDictionary> {
        Arc::clone(&LONG_WALLS)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves the display label for a feature
#[derive(Debug, Clone)]
pub struct LabelResolver {
    general: Arc<LabelDictionary>,
    lines: Arc<LabelDictionary>,
}

impl LabelResolver {
    pub fn new(general: Arc<LabelDictionary>, lines: Arc<LabelDictionary>) -> Self {
        Self { general, lines }
    }

    /// Line override, general dictionary, `short`, `title`, raw name,
    /// then empty. An empty label means "draw the shape, skip the text".
    pub fn resolve<'a>(&'a self, feature: &'a Feature, is_line: bool) -> Cow<'a, str> {
        let name = feature.name();

        if let Some(name) = name {
            if is_line {
                if let Some(label) = self.lines.get(name) {
                    return Cow::Borrowed(label);
                }
            }
            if let Some(label) = self.general.get(name) {
                return Cow::Borrowed(label);
            }
        }

        let props = &feature.properties;
        props
            .short
            .as_deref()
            .or(props.title.as_deref())
            .or(name)
            .map(Cow::Borrowed)
            .unwrap_or_default()
    }
}

impl Default for LabelResolver {
    fn default() -> Self {
        Self::new(LabelDictionary::landmarks(), LabelDictionary::long_walls())
    }
}
