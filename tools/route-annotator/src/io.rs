use anyhow::{bail, Context, Result};
use geojson::{Feature, JsonObject};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One element of a collection's `features` array.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Feature(Feature),
    /// Not valid GeoJSON; carried through untouched when rewriting a file
    Opaque(Value),
}

/// A FeatureCollection loaded leniently from disk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadedCollection {
    pub entries: Vec<Entry>,
    /// Top-level members other than `type` and `features`
    pub members: JsonObject,
}

impl LoadedCollection {
    /// Valid features, in file order
    pub fn features(&self) -> Vec<Feature> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Feature(f) => Some(f.clone()),
                Entry::Opaque(_) => None,
            })
            .collect()
    }

    pub fn opaque_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Opaque(_)))
            .count()
    }

    /// Swap in rewritten versions of the valid features, leaving opaque
    /// entries where they were. `features` must be in the order returned by
    /// [`LoadedCollection::features`].
    pub fn with_features(self, features: Vec<Feature>) -> Result<Self> {
        let expected = self.entries.len() - self.opaque_count();
        if features.len() != expected {
            bail!(
                "Expected {} rewritten features, got {}",
                expected,
                features.len()
            );
        }

        let mut replacements = features.into_iter();
        let entries = self
            .entries
            .into_iter()
            .map(|e| match e {
                Entry::Feature(_) => replacements.next().map(Entry::Feature).unwrap_or(e),
                Entry::Opaque(_) => e,
            })
            .collect();

        Ok(Self {
            entries,
            members: self.members,
        })
    }

    /// Like [`LoadedCollection::with_features`], but features past the
    /// existing valid ones are appended after every entry, opaque ones
    /// included. Takes the output of a concatenation over
    /// [`LoadedCollection::features`].
    pub fn with_appended(self, mut features: Vec<Feature>) -> Result<Self> {
        let expected = self.entries.len() - self.opaque_count();
        if features.len() < expected {
            bail!(
                "Expected at least {} features, got {}",
                expected,
                features.len()
            );
        }

        let appended = features.split_off(expected);
        let mut collection = self.with_features(features)?;
        collection
            .entries
            .extend(appended.into_iter().map(Entry::Feature));
        Ok(collection)
    }

    pub fn from_features(features: Vec<Feature>) -> Self {
        Self {
            entries: features.into_iter().map(Entry::Feature).collect(),
            members: JsonObject::new(),
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        let mut object = JsonObject::new();
        object.insert("type".to_string(), Value::from("FeatureCollection"));
        for (k, v) in &self.members {
            object.insert(k.clone(), v.clone());
        }

        let mut features = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            features.push(match entry {
                Entry::Feature(f) => serde_json::to_value(f).context("Failed to serialize feature")?,
                Entry::Opaque(v) => v.clone(),
            });
        }
        object.insert("features".to_string(), Value::Array(features));

        Ok(Value::Object(object))
    }
}

/// Drop a UTF-8 BOM and anything before the first `{`.
pub fn strip_preamble(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}');
    match text.find('{') {
        Some(i) => &text[i..],
        None => text,
    }
}

/// Parse a FeatureCollection, keeping features that fail GeoJSON validation
/// as opaque entries.
pub fn parse_collection(text: &str) -> Result<LoadedCollection> {
    let root: Value =
        serde_json::from_str(strip_preamble(text)).context("Failed to parse JSON")?;

    let Value::Object(mut object) = root else {
        bail!("Top-level JSON value is not an object");
    };

    let raw_features = match object.remove("features") {
        Some(Value::Array(features)) => features,
        _ => Vec::new(),
    };
    object.remove("type");

    let entries = raw_features
        .into_iter()
        .enumerate()
        .map(|(i, value)| match Feature::from_json_value(value.clone()) {
            Ok(feature) => Entry::Feature(feature),
            Err(e) => {
                log::warn!("  Feature #{} is not valid GeoJSON ({}), leaving it as is", i, e);
                Entry::Opaque(value)
            }
        })
        .collect();

    Ok(LoadedCollection {
        entries,
        members: object,
    })
}

pub fn read_collection(path: &Path) -> Result<LoadedCollection> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;

    parse_collection(&content)
        .with_context(|| format!("Failed to parse GeoJSON from: {}", path.display()))
}

/// Write a collection; pretty-printed output is indented by two spaces.
pub fn write_collection(collection: &LoadedCollection, output_path: &Path, pretty: bool) -> Result<()> {
    log::info!(
        "Writing {} features to {}",
        collection.entries.len(),
        output_path.display()
    );

    let value = collection.to_json()?;
    let json_string = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}

/// `<dir>/<stem>_backup_<timestamp>.geojson`
pub fn backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "collection".to_string());
    path.with_file_name(format!("{}_backup_{}.geojson", stem, timestamp))
}

/// Copy `path` to a timestamped sibling before it gets overwritten.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup = backup_path(path, &timestamp);

    std::fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to back up {} to {}",
            path.display(),
            backup.display()
        )
    })?;

    log::info!("Backup created at {}", backup.display());
    Ok(backup)
}
