//! Persisted node parameter trees.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single persisted parameter value.
///
/// Path-valued entries carry absolute workspace paths at capture time; the
/// conversion step rewrites them to job-relative names before the tree is
/// serialized into a configuration description.
#[derive(Clone, PartialEq)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    /// Free-form text.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean switch.
    Toggle(bool),
    /// A single file path.
    Path(PathBuf),
    /// An ordered list of file paths.
    PathList(Vec<PathBuf>),
    /// A nested group of settings.
    Group(Settings),
}

/// An ordered tree of persisted parameters, keyed by setting name.
#[derive(Clone, PartialEq, Default)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, SettingValue>);

impl Settings {
    /// Creates an empty settings tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one if present.
    pub fn insert(&mut self, key: impl Into<String>, value: SettingValue) -> Option<SettingValue> {
        self.0.insert(key.into(), value)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: SettingValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// Returns whether the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.0.iter()
    }

    /// Rewrites every path-valued entry in the tree, recursing into groups.
    ///
    /// The callback receives the setting key, the index of the path within
    /// its entry (always `0` for single paths) and the current path, and
    /// returns the replacement.
    pub fn rewrite_paths<F>(&mut self, rewrite: &mut F)
    where
        F: FnMut(&str, usize, &Path) -> PathBuf,
    {
        for (key, value) in self.0.iter_mut() {
            match value {
                SettingValue::Path(path) => {
                    *path = rewrite(key, 0, path);
                }
                SettingValue::PathList(paths) => {
                    for (index, path) in paths.iter_mut().enumerate() {
                        *path = rewrite(key, index, path);
                    }
                }
                SettingValue::Group(group) => group.rewrite_paths(rewrite),
                SettingValue::Text(_) | SettingValue::Number(_) | SettingValue::Toggle(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut settings = Settings::new();
        settings.insert("threads", SettingValue::Number(4.0));
        assert_eq!(settings.len(), 1);
        assert_eq!(settings.get("threads"), Some(&SettingValue::Number(4.0)));
        assert_eq!(settings.get("missing"), None);
    }

    #[test]
    fn test_serde_tagged_values() {
        let settings = Settings::new()
            .with("verbose", SettingValue::Toggle(true))
            .with("words", SettingValue::Path(PathBuf::from("/data/words.txt")));

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["verbose"]["kind"], "toggle");
        assert_eq!(json["verbose"]["value"], true);
        assert_eq!(json["words"]["kind"], "path");
        assert_eq!(json["words"]["value"], "/data/words.txt");

        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_rewrite_paths_recurses_groups() {
        let mut settings = Settings::new()
            .with("words", SettingValue::Path(PathBuf::from("/data/words.txt")))
            .with(
                "extras",
                SettingValue::PathList(vec![
                    PathBuf::from("/data/a.txt"),
                    PathBuf::from("/data/b.txt"),
                ]),
            )
            .with(
                "advanced",
                SettingValue::Group(
                    Settings::new()
                        .with("dict", SettingValue::Path(PathBuf::from("/data/dict.txt"))),
                ),
            );

        let mut seen = Vec::new();
        settings.rewrite_paths(&mut |key, index, path| {
            seen.push((key.to_owned(), index, path.to_path_buf()));
            PathBuf::from(format!("{key}_{index}"))
        });

        assert_eq!(seen.len(), 4);
        assert_eq!(
            settings.get("words"),
            Some(&SettingValue::Path(PathBuf::from("words_0")))
        );
        assert_eq!(
            settings.get("extras"),
            Some(&SettingValue::PathList(vec![
                PathBuf::from("extras_0"),
                PathBuf::from("extras_1"),
            ]))
        );
        let Some(SettingValue::Group(advanced)) = settings.get("advanced") else {
            panic!("group entry lost");
        };
        assert_eq!(
            advanced.get("dict"),
            Some(&SettingValue::Path(PathBuf::from("dict_0")))
        );
    }

    #[test]
    fn test_scalar_entries_untouched() {
        let mut settings = Settings::new().with("label", SettingValue::Text("mixer".into()));
        settings.rewrite_paths(&mut |_, _, path| path.to_path_buf());
        assert_eq!(
            settings.get("label"),
            Some(&SettingValue::Text("mixer".into()))
        );
    }
}
