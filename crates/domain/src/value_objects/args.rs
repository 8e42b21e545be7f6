//! Args, globals, parameters and arg types.
//!
//! All of these are JSON records: they cross the channel unchanged and are
//! merged key by key. Ordering inside a record carries no meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User-adjustable inputs of one story, keyed by arg name.
pub type Args = Map<String, Value>;

/// Runtime toggles shared by every story (theme, locale, ...).
pub type Globals = Map<String, Value>;

/// Free-form story metadata, deep-merged from global to story level.
pub type Parameters = Map<String, Value>;

/// Declarations of the globals a preview understands, keyed by global name.
pub type GlobalTypes = Map<String, Value>;

/// Arg type declarations keyed by arg name.
pub type ArgTypes = std::collections::BTreeMap<String, ArgType>;

/// The primitive shape of an arg value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum SbType {
    Boolean,
    String,
    Number,
    Object,
    Array,
    Function,
    #[serde(other)]
    Other,
}

impl SbType {
    /// Infer the type of a concrete value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Bool(_) => SbType::Boolean,
            Value::String(_) => SbType::String,
            Value::Number(_) => SbType::Number,
            Value::Array(_) => SbType::Array,
            Value::Object(_) => SbType::Object,
            Value::Null => SbType::Other,
        }
    }
}

/// Declaration of a single arg.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sb_type: Option<SbType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Value>,
    /// Addon-specific keys we carry but do not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArgType {
    pub fn named(name: impl Into<String>, sb_type: SbType) -> Self {
        Self {
            name: Some(name.into()),
            sb_type: Some(sb_type),
            ..Self::default()
        }
    }

    /// Field-wise merge where `over` wins whenever it sets a field.
    pub fn merged_with(&self, over: &ArgType) -> ArgType {
        let mut extra = self.extra.clone();
        for (key, value) in &over.extra {
            extra.insert(key.clone(), value.clone());
        }
        ArgType {
            name: over.name.clone().or_else(|| self.name.clone()),
            sb_type: over.sb_type.or(self.sb_type),
            description: over.description.clone().or_else(|| self.description.clone()),
            default_value: over
                .default_value
                .clone()
                .or_else(|| self.default_value.clone()),
            options: over.options.clone().or_else(|| self.options.clone()),
            control: over.control.clone().or_else(|| self.control.clone()),
            extra,
        }
    }

    /// Coerce a persisted value (usually a string from a URL) to this arg's type.
    ///
    /// Returns `None` when the value cannot represent the declared type.
    pub fn map_value(&self, value: &Value) -> Option<Value> {
        let Some(sb_type) = self.sb_type else {
            return Some(value.clone());
        };
        match (sb_type, value) {
            (_, Value::Null) => Some(Value::Null),
            (SbType::String, Value::String(_)) => Some(value.clone()),
            (SbType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (SbType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (SbType::Number, Value::Number(_)) => Some(value.clone()),
            (SbType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(|n| match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Value::from(f as i64)
                    }
                    _ => Value::Number(n),
                }),
            (SbType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (SbType::Boolean, Value::String(s)) => Some(Value::Bool(s == "true")),
            (SbType::Array, Value::Array(_)) => Some(value.clone()),
            (SbType::Object, Value::Object(_)) => Some(value.clone()),
            (SbType::Function, _) => None,
            (SbType::Other, _) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Keep only persisted args that are declared and type-compatible.
///
/// Returns the mapped args plus the names that were dropped.
pub fn map_args_to_types(args: &Args, arg_types: &ArgTypes) -> (Args, Vec<String>) {
    let mut mapped = Args::new();
    let mut dropped = Vec::new();
    for (key, value) in args {
        match arg_types.get(key).and_then(|arg_type| arg_type.map_value(value)) {
            Some(value) => {
                mapped.insert(key.clone(), value);
            }
            None => dropped.push(key.clone()),
        }
    }
    (mapped, dropped)
}

/// Merge arg type layers, later layers winning field by field.
pub fn combine_arg_types(layers: &[&ArgTypes]) -> ArgTypes {
    let mut combined = ArgTypes::new();
    for layer in layers {
        for (key, arg_type) in layer.iter() {
            let merged = match combined.get(key) {
                Some(existing) => existing.merged_with(arg_type),
                None => arg_type.clone(),
            };
            combined.insert(key.clone(), merged);
        }
    }
    combined
}

/// Add an inferred declaration for every arg that has none yet, and fill in
/// missing names and types on existing declarations.
pub fn infer_arg_types(arg_types: &ArgTypes, initial_args: &Args) -> ArgTypes {
    let mut inferred = arg_types.clone();
    for (key, value) in initial_args {
        let guess = ArgType::named(key.clone(), SbType::of_value(value));
        let entry = inferred.entry(key.clone()).or_default();
        *entry = guess.merged_with(entry);
    }
    for (key, arg_type) in inferred.iter_mut() {
        if arg_type.name.is_none() {
            arg_type.name = Some(key.clone());
        }
    }
    inferred
}

/// Deep-merge parameter layers. Objects merge recursively; any other value
/// (arrays included) is replaced by the later layer.
pub fn combine_parameters(layers: &[&Parameters]) -> Parameters {
    let mut combined = Parameters::new();
    for layer in layers {
        merge_into(&mut combined, layer);
    }
    combined
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Shallow merge: every key of `partial` overwrites the same key in `target`.
pub fn shallow_merge(target: &mut Map<String, Value>, partial: &Map<String, Value>) {
    for (key, value) in partial {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn parameters_merge_deeply_but_replace_arrays() {
        let global = obj(json!({"docs": {"container": "Wrapper"}, "tags": ["a"]}));
        let story = obj(json!({"docs": {"page": "Page"}, "tags": ["b"]}));

        let combined = combine_parameters(&[&global, &story]);

        assert_eq!(
            Value::Object(combined),
            json!({"docs": {"container": "Wrapper", "page": "Page"}, "tags": ["b"]})
        );
    }

    #[test]
    fn arg_types_merge_field_by_field() {
        let mut global = ArgTypes::new();
        global.insert(
            "size".into(),
            ArgType {
                description: Some("How big".into()),
                ..ArgType::default()
            },
        );
        let mut story = ArgTypes::new();
        story.insert("size".into(), ArgType::named("size", SbType::Number));

        let combined = combine_arg_types(&[&global, &story]);
        let size = &combined["size"];
        assert_eq!(size.description.as_deref(), Some("How big"));
        assert_eq!(size.sb_type, Some(SbType::Number));
    }

    #[test]
    fn inference_does_not_override_declared_types() {
        let mut declared = ArgTypes::new();
        declared.insert("count".into(), ArgType::named("count", SbType::String));
        let args = obj(json!({"count": 3, "label": "hi"}));

        let inferred = infer_arg_types(&declared, &args);

        assert_eq!(inferred["count"].sb_type, Some(SbType::String));
        assert_eq!(inferred["label"].sb_type, Some(SbType::String));
        assert_eq!(inferred["label"].name.as_deref(), Some("label"));
    }

    #[test]
    fn persisted_strings_are_coerced_to_declared_types() {
        let mut arg_types = ArgTypes::new();
        arg_types.insert("count".into(), ArgType::named("count", SbType::Number));
        arg_types.insert("active".into(), ArgType::named("active", SbType::Boolean));
        arg_types.insert("items".into(), ArgType::named("items", SbType::Array));
        let persisted = obj(json!({
            "count": "12",
            "active": "true",
            "items": "not-an-array",
            "unknown": "x"
        }));

        let (mapped, mut dropped) = map_args_to_types(&persisted, &arg_types);
        dropped.sort();

        assert_eq!(Value::Object(mapped), json!({"count": 12, "active": true}));
        assert_eq!(dropped, vec!["items".to_string(), "unknown".to_string()]);
    }

    #[test]
    fn unparseable_number_is_dropped() {
        let arg_type = ArgType::named("count", SbType::Number);
        assert_eq!(arg_type.map_value(&json!("twelve")), None);
        assert_eq!(arg_type.map_value(&json!("1.5")), Some(json!(1.5)));
    }
}
