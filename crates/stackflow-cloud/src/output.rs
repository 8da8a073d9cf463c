//! Deferred property values
//!
//! A resource's computed fields (ids, endpoints, keys) only exist once the
//! external engine has provisioned it. Declarations therefore pass around
//! [`Output`] placeholders. A reference output shares a write-once cell with
//! every clone of itself, so the first resolved value is what every reader
//! sees.

use crate::urn::Urn;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Reference to a property of a declared resource
#[derive(Clone)]
pub struct PropertyRef {
    urn: Urn,
    property: String,
    cell: Arc<OnceLock<Value>>,
}

impl PropertyRef {
    pub(crate) fn new(urn: Urn, property: impl Into<String>, cell: Arc<OnceLock<Value>>) -> Self {
        Self {
            urn,
            property: property.into(),
            cell,
        }
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    /// Dotted property path, e.g. `primaryEndpoints.web`
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn value(&self) -> Option<&Value> {
        self.cell.get()
    }

    /// Store the resolved value. Returns `false` if the cell was already set;
    /// the first value is kept.
    pub fn resolve(&self, value: Value) -> bool {
        match self.cell.set(value) {
            Ok(()) => true,
            Err(rejected) => {
                if self.cell.get() != Some(&rejected) {
                    tracing::warn!(
                        urn = %self.urn,
                        property = %self.property,
                        "Ignoring second resolution with a different value"
                    );
                }
                false
            }
        }
    }
}

impl fmt::Debug for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRef")
            .field("urn", &self.urn)
            .field("property", &self.property)
            .field("resolved", &self.cell.get().is_some())
            .finish()
    }
}

/// A local file uploaded verbatim by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAsset {
    path: PathBuf,
}

impl FileAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists relative to `base`
    pub fn exists_in(&self, base: &Path) -> bool {
        base.join(&self.path).is_file()
    }
}

/// Untyped property tree as it is recorded in the resource graph
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Known(Value),
    Ref(PropertyRef),
    /// String interpolation; parts are rendered and joined in order
    Concat(Vec<PropertyValue>),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
    Asset(FileAsset),
}

impl PropertyValue {
    /// The concrete value, if every reference inside has been resolved
    pub fn resolved(&self) -> Option<Value> {
        match self {
            PropertyValue::Known(value) => Some(value.clone()),
            PropertyValue::Ref(reference) => reference.value().cloned(),
            PropertyValue::Concat(parts) => {
                let mut rendered = String::new();
                for part in parts {
                    match part.resolved()? {
                        Value::String(s) => rendered.push_str(&s),
                        other => rendered.push_str(&other.to_string()),
                    }
                }
                Some(Value::String(rendered))
            }
            PropertyValue::Array(items) => items
                .iter()
                .map(PropertyValue::resolved)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            PropertyValue::Object(fields) => fields
                .iter()
                .map(|(k, v)| v.resolved().map(|v| (k.clone(), v)))
                .collect::<Option<Map<_, _>>>()
                .map(Value::Object),
            PropertyValue::Asset(asset) => Some(asset_wire(asset)),
        }
    }

    /// Every resource property this value depends on
    pub fn references(&self) -> Vec<&PropertyRef> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a PropertyRef>) {
        match self {
            PropertyValue::Known(_) | PropertyValue::Asset(_) => {}
            PropertyValue::Ref(reference) => refs.push(reference),
            PropertyValue::Concat(items) | PropertyValue::Array(items) => {
                for item in items {
                    item.collect_references(refs);
                }
            }
            PropertyValue::Object(fields) => {
                for value in fields.values() {
                    value.collect_references(refs);
                }
            }
        }
    }

    /// Wire form used in the deployment document
    pub fn to_wire(&self) -> Value {
        match self {
            PropertyValue::Known(value) => value.clone(),
            PropertyValue::Ref(reference) => json!({
                "$ref": {
                    "urn": reference.urn(),
                    "property": reference.property(),
                }
            }),
            PropertyValue::Concat(parts) => json!({
                "$concat": parts.iter().map(PropertyValue::to_wire).collect::<Vec<_>>()
            }),
            PropertyValue::Array(items) => {
                Value::Array(items.iter().map(PropertyValue::to_wire).collect())
            }
            PropertyValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
            PropertyValue::Asset(asset) => asset_wire(asset),
        }
    }

    /// Follow a dotted path into nested objects, e.g. `siteConfig.appSettings`
    pub fn pointer(&self, path: &str) -> Option<&PropertyValue> {
        path.split('.').try_fold(self, |current, segment| match current {
            PropertyValue::Object(fields) => fields.get(segment),
            PropertyValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn as_reference(&self) -> Option<&PropertyRef> {
        match self {
            PropertyValue::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_known(&self) -> Option<&Value> {
        match self {
            PropertyValue::Known(value) => Some(value),
            _ => None,
        }
    }
}

fn asset_wire(asset: &FileAsset) -> Value {
    json!({ "$asset": { "path": asset.path().to_string_lossy() } })
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Known(Value::String(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Known(Value::String(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Known(Value::from(value))
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Known(value)
    }
}

impl From<FileAsset> for PropertyValue {
    fn from(asset: FileAsset) -> Self {
        PropertyValue::Asset(asset)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(items)
    }
}

impl<T> From<Output<T>> for PropertyValue {
    fn from(output: Output<T>) -> Self {
        output.value
    }
}

impl<T> From<&Output<T>> for PropertyValue {
    fn from(output: &Output<T>) -> Self {
        output.value.clone()
    }
}

/// Builder for a resource's input object
#[derive(Debug, Clone, Default)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with_opt<V: Into<PropertyValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> BTreeMap<String, PropertyValue> {
        self.0
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Object(map.0)
    }
}

/// A typed, possibly not-yet-known value
pub struct Output<T> {
    value: PropertyValue,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Output<T> {
    /// A value that is known at declaration time
    pub fn known(value: impl Into<Value>) -> Self {
        Self::from_value(PropertyValue::Known(value.into()))
    }

    pub(crate) fn from_value(value: PropertyValue) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn as_value(&self) -> &PropertyValue {
        &self.value
    }

    /// The property this output reads, when it is a plain reference
    pub fn as_reference(&self) -> Option<&PropertyRef> {
        self.value.as_reference()
    }

    pub fn is_known(&self) -> bool {
        self.value.resolved().is_some()
    }

    pub fn references(&self) -> Vec<&PropertyRef> {
        self.value.references()
    }

    /// Drop the static type, e.g. to export heterogeneous outputs
    pub fn untyped(self) -> Output<Value> {
        Output::from_value(self.value)
    }
}

impl<T: DeserializeOwned> Output<T> {
    /// Read the value; `None` until the engine has resolved it
    pub fn get(&self) -> Option<T> {
        self.value
            .resolved()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl Output<String> {
    /// Join string parts in order; see [`interpolate!`](crate::interpolate)
    pub fn concat(parts: impl IntoIterator<Item = Output<String>>) -> Self {
        Self::from_value(PropertyValue::Concat(
            parts.into_iter().map(|part| part.value).collect(),
        ))
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Output").field(&self.value).finish()
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Output::known(value)
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Output::known(value)
    }
}

impl From<&Output<String>> for Output<String> {
    fn from(output: &Output<String>) -> Self {
        output.clone()
    }
}

/// Build an `Output<String>` from literal and deferred parts
///
/// ```ignore
/// let setting = interpolate!("InstrumentationKey=", &component.instrumentation_key);
/// ```
#[macro_export]
macro_rules! interpolate {
    ($($part:expr),+ $(,)?) => {
        $crate::Output::<String>::concat([
            $($crate::Output::<String>::from($part)),+
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(property: &str) -> PropertyRef {
        PropertyRef::new(
            Urn::new("dev", "web", "test:Thing", "thing"),
            property,
            Arc::default(),
        )
    }

    #[test]
    fn test_known_output_is_readable() {
        let output: Output<String> = Output::known("EastUS");
        assert!(output.is_known());
        assert_eq!(output.get().as_deref(), Some("EastUS"));
    }

    #[test]
    fn test_reference_unknown_until_resolved() {
        let r = reference("documentEndpoint");
        let output: Output<String> = Output::from_value(PropertyValue::Ref(r.clone()));
        assert_eq!(output.get(), None);

        assert!(r.resolve(json!("https://db.example.com:443/")));
        assert_eq!(output.get().as_deref(), Some("https://db.example.com:443/"));
    }

    #[test]
    fn test_reference_is_write_once() {
        let r = reference("id");
        let output: Output<String> = Output::from_value(PropertyValue::Ref(r.clone()));
        let copy = output.clone();

        assert!(r.resolve(json!("first")));
        assert!(!r.resolve(json!("second")));
        assert_eq!(output.get().as_deref(), Some("first"));
        assert_eq!(copy.get().as_deref(), Some("first"));
    }

    #[test]
    fn test_interpolate_waits_for_every_part() {
        let r = reference("instrumentationKey");
        let key: Output<String> = Output::from_value(PropertyValue::Ref(r.clone()));
        let setting = crate::interpolate!("InstrumentationKey=", &key);

        assert_eq!(setting.get(), None);
        assert_eq!(setting.references().len(), 1);

        r.resolve(json!("abc-123"));
        assert_eq!(setting.get().as_deref(), Some("InstrumentationKey=abc-123"));
    }

    #[test]
    fn test_wire_form() {
        let r = reference("primaryEndpoints.web");
        let value = PropertyValue::Object(BTreeMap::from([
            ("endpoint".to_string(), PropertyValue::Ref(r)),
            ("literal".to_string(), PropertyValue::from("x")),
            (
                "asset".to_string(),
                PropertyValue::from(FileAsset::new("./websrc/index.html")),
            ),
        ]));

        let wire = value.to_wire();
        assert_eq!(wire["literal"], json!("x"));
        assert_eq!(wire["endpoint"]["$ref"]["property"], json!("primaryEndpoints.web"));
        assert_eq!(wire["asset"]["$asset"]["path"], json!("./websrc/index.html"));
    }

    #[test]
    fn test_pointer_walks_objects_and_arrays() {
        let value: PropertyValue = PropertyMap::new()
            .with(
                "siteConfig",
                PropertyMap::new().with(
                    "appSettings",
                    vec![PropertyValue::from(PropertyMap::new().with("name", "A"))],
                ),
            )
            .into();

        let name = value.pointer("siteConfig.appSettings.0.name").unwrap();
        assert_eq!(name.as_known(), Some(&json!("A")));
        assert!(value.pointer("siteConfig.missing").is_none());
    }

    #[test]
    fn test_array_resolution_requires_all_items() {
        let r = reference("id");
        let value =
            PropertyValue::Array(vec![PropertyValue::from("a"), PropertyValue::Ref(r.clone())]);
        assert!(value.resolved().is_none());
        r.resolve(json!("b"));
        assert_eq!(value.resolved(), Some(json!(["a", "b"])));
    }
}
