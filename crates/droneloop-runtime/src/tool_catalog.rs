//! [`ToolCatalog`] – the fixed set of actions offered to the model.
//!
//! Each [`ActionKind`] contributes one [`ToolSpec`] whose parameter schema
//! is generated from the typed parameter struct with `schemars`, so the
//! contract the model sees and the decoder that enforces it can never drift
//! apart.  Every schema is compiled once into a `jsonschema` validator and
//! checked against incoming payloads before typed decoding.
//!
//! Under a strict catalog, payloads with unknown fields or missing required
//! fields are rejected.  A lenient catalog still rejects missing fields but
//! silently drops unknown ones.

use droneloop_types::{
    ActionKind, CameraPitchParams, DroneCommand, DroneError, MoveParams, NoParams, ProposedAction,
    ToolSpec, TurnParams,
};
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde_json::{Map, Value, json};
use tracing::warn;

struct CatalogEntry {
    kind: ActionKind,
    /// `None` when the generated schema failed to compile; typed decoding
    /// still applies.
    validator: Option<jsonschema::Validator>,
}

/// Ordered, immutable tool catalog.
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    /// Catalog of every [`ActionKind`], in [`ActionKind::ALL`] order.
    pub fn standard(strict: bool) -> Self {
        Self::with_kinds(&ActionKind::ALL, strict)
    }

    /// Catalog restricted to `kinds`, in the given order.
    pub fn with_kinds(kinds: &[ActionKind], strict: bool) -> Self {
        let mut specs = Vec::with_capacity(kinds.len());
        let mut entries = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let parameters = parameters_schema(kind, strict);
            let validator = match jsonschema::validator_for(&parameters) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(tool = kind.name(), error = %e, "parameter schema does not compile; skipping schema validation");
                    None
                }
            };
            specs.push(ToolSpec {
                name: kind.name().to_string(),
                description: kind.description().to_string(),
                parameters,
                strict,
            });
            entries.push(CatalogEntry { kind, validator });
        }

        Self { specs, entries }
    }

    /// Specs in catalog order, as sent to the completion service.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Decode a proposed action into a typed command.
    ///
    /// # Errors
    ///
    /// - [`DroneError::UnknownAction`] when the name is not in this catalog.
    ///   This means the catalog and the completion service disagree and is
    ///   not recoverable.
    /// - [`DroneError::InvalidParameters`] when the arguments are not JSON,
    ///   violate the schema, or fail typed decoding.
    pub fn decode(&self, action: &ProposedAction) -> Result<DroneCommand, DroneError> {
        let (index, entry) = ActionKind::from_name(&action.name)
            .and_then(|kind| self.entries.iter().enumerate().find(|(_, e)| e.kind == kind))
            .ok_or_else(|| DroneError::UnknownAction(action.name.clone()))?;
        let spec = &self.specs[index];

        let invalid = |details: String| DroneError::InvalidParameters {
            action: action.name.clone(),
            details,
        };

        let arguments: Value = if action.arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&action.arguments)
                .map_err(|e| invalid(format!("arguments are not valid JSON: {e}")))?
        };

        if let Some(validator) = &entry.validator {
            if let Some(errors) = validation_errors(validator, &arguments) {
                return Err(invalid(errors));
            }
        }

        let arguments = if spec.strict {
            arguments
        } else {
            retain_known_fields(arguments, &spec.parameters)
        };

        DroneCommand::decode(entry.kind, arguments).map_err(|e| invalid(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Schema generation
// ─────────────────────────────────────────────────────────────────────────────

fn parameters_schema(kind: ActionKind, strict: bool) -> Value {
    let mut schema = match kind {
        ActionKind::TakeOff | ActionKind::Land | ActionKind::GetWeatherInfo => {
            schema_of::<NoParams>()
        }
        ActionKind::Move => schema_of::<MoveParams>(),
        ActionKind::Turn => schema_of::<TurnParams>(),
        ActionKind::SetCameraPitch => schema_of::<CameraPitchParams>(),
    };
    // Struct rustdoc is not model-facing.
    if let Value::Object(map) = &mut schema {
        map.remove("description");
    }
    normalize(&mut schema, strict);
    schema
}

fn schema_of<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .into_generator();
    serde_json::to_value(generator.into_root_schema_for::<T>()).unwrap_or(Value::Null)
}

/// Reduce a generated schema to the subset function-calling APIs accept.
///
/// Object schemas always list `properties` and `required`; strictness is
/// expressed through `additionalProperties`.
fn normalize(schema: &mut Value, strict: bool) {
    let Value::Object(map) = schema else {
        return;
    };
    for key in ["$schema", "title", "format", "definitions"] {
        map.remove(key);
    }

    if map.get("type").and_then(Value::as_str) == Some("object") {
        map.entry("properties").or_insert_with(|| json!({}));
        map.entry("required").or_insert_with(|| json!([]));
        if strict {
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        } else {
            map.remove("additionalProperties");
        }
    }

    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for property in properties.values_mut() {
            normalize(property, strict);
        }
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(variants)) = map.get_mut(key) {
            for variant in variants {
                normalize(variant, strict);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payload checks
// ─────────────────────────────────────────────────────────────────────────────

fn validation_errors(validator: &jsonschema::Validator, arguments: &Value) -> Option<String> {
    let errors: Vec<String> = validator
        .iter_errors(arguments)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}

/// Drop top-level keys the schema does not declare.
fn retain_known_fields(arguments: Value, schema: &Value) -> Value {
    let Value::Object(mut map) = arguments else {
        return arguments;
    };
    let known = schema.get("properties").and_then(Value::as_object);
    map.retain(|key, _| known.is_some_and(|props| props.contains_key(key)));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use droneloop_types::{MoveDirection, TurnDirection};

    fn action(name: &str, arguments: &str) -> ProposedAction {
        ProposedAction {
            call_id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn spec<'a>(catalog: &'a ToolCatalog, name: &str) -> &'a ToolSpec {
        catalog.specs().iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn standard_catalog_lists_every_action_in_order() {
        let catalog = ToolCatalog::standard(true);
        let names: Vec<&str> = catalog.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["takeoff", "land", "move", "turn", "set_camera_pitch", "get_weather_info"]
        );
        assert!(catalog.specs().iter().all(|s| s.strict && !s.description.is_empty()));
    }

    #[test]
    fn strict_schema_closes_the_object() {
        let catalog = ToolCatalog::standard(true);
        let schema = &spec(&catalog, "move").parameters;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"direction"));
        assert!(required.contains(&"distance"));
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
    }

    #[test]
    fn schemas_carry_no_struct_docs() {
        let catalog = ToolCatalog::standard(true);
        for spec in catalog.specs() {
            assert!(
                spec.parameters.get("description").is_none(),
                "{} leaks a struct description",
                spec.name
            );
        }
        let schema = &spec(&catalog, "move").parameters;
        assert!(schema["properties"]["distance"]["description"].is_string());
    }

    #[test]
    fn turn_angle_outside_one_revolution_is_invalid() {
        let catalog = ToolCatalog::standard(true);
        for angle in ["1e39", "-90", "400"] {
            let args = format!(r#"{{"direction":"clockwise","angle":{angle}}}"#);
            let err = catalog.decode(&action("turn", &args)).unwrap_err();
            assert!(
                matches!(err, DroneError::InvalidParameters { ref action, .. } if action == "turn"),
                "angle {angle} gave {err:?}"
            );
        }
    }

    #[test]
    fn empty_schema_still_lists_properties() {
        let catalog = ToolCatalog::standard(true);
        let schema = &spec(&catalog, "takeoff").parameters;
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn enumerated_values_appear_in_schema() {
        let catalog = ToolCatalog::standard(true);
        let turn = spec(&catalog, "turn").parameters.to_string();
        assert!(turn.contains("counterclockwise"));
        let mv = spec(&catalog, "move").parameters.to_string();
        for dir in ["forward", "backward", "left", "right", "up", "down"] {
            assert!(mv.contains(dir), "missing {dir}");
        }
    }

    #[test]
    fn lenient_schema_leaves_object_open() {
        let catalog = ToolCatalog::standard(false);
        let schema = &spec(&catalog, "move").parameters;
        assert!(schema.get("additionalProperties").is_none());
        assert!(!spec(&catalog, "move").strict);
    }

    #[test]
    fn well_formed_payloads_decode_for_every_action() {
        let catalog = ToolCatalog::standard(true);
        let payloads = [
            ("takeoff", "{}"),
            ("land", ""),
            ("move", r#"{"direction":"left","distance":1.5}"#),
            ("turn", r#"{"direction":"clockwise","angle":90}"#),
            ("set_camera_pitch", r#"{"angle":45}"#),
            ("get_weather_info", "{}"),
        ];
        for (name, args) in payloads {
            let cmd = catalog
                .decode(&action(name, args))
                .unwrap_or_else(|e| panic!("{name} failed: {e}"));
            assert_eq!(cmd.kind().name(), name);
        }
    }

    #[test]
    fn decoded_move_carries_typed_values() {
        let catalog = ToolCatalog::standard(true);
        let cmd = catalog
            .decode(&action("move", r#"{"direction":"forward","distance":2}"#))
            .unwrap();
        assert_eq!(
            cmd,
            DroneCommand::Move(MoveParams {
                direction: MoveDirection::Forward,
                distance: 2.0,
            })
        );
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let catalog = ToolCatalog::standard(true);
        let err = catalog
            .decode(&action("turn", r#"{"direction":"clockwise"}"#))
            .unwrap_err();
        match err {
            DroneError::InvalidParameters { action, details } => {
                assert_eq!(action, "turn");
                assert!(details.contains("angle"), "details: {details}");
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn extra_field_is_invalid_when_strict() {
        let catalog = ToolCatalog::standard(true);
        let err = catalog
            .decode(&action(
                "turn",
                r#"{"direction":"clockwise","angle":30,"speed":"fast"}"#,
            ))
            .unwrap_err();
        assert!(matches!(err, DroneError::InvalidParameters { .. }));

        let err = catalog.decode(&action("land", r#"{"gently":true}"#)).unwrap_err();
        assert!(matches!(err, DroneError::InvalidParameters { .. }));
    }

    #[test]
    fn extra_field_is_dropped_when_lenient() {
        let catalog = ToolCatalog::standard(false);
        let cmd = catalog
            .decode(&action(
                "turn",
                r#"{"direction":"counterclockwise","angle":30,"speed":"fast"}"#,
            ))
            .unwrap();
        assert_eq!(
            cmd,
            DroneCommand::Turn(TurnParams {
                direction: TurnDirection::Counterclockwise,
                angle: 30.0,
            })
        );
    }

    #[test]
    fn missing_field_is_invalid_even_when_lenient() {
        let catalog = ToolCatalog::standard(false);
        assert!(matches!(
            catalog.decode(&action("move", r#"{"direction":"up"}"#)),
            Err(DroneError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn out_of_range_pitch_is_invalid() {
        let catalog = ToolCatalog::standard(true);
        assert!(matches!(
            catalog.decode(&action("set_camera_pitch", r#"{"angle":120}"#)),
            Err(DroneError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn enum_outside_closed_set_is_invalid() {
        let catalog = ToolCatalog::standard(true);
        assert!(matches!(
            catalog.decode(&action("move", r#"{"direction":"north","distance":1}"#)),
            Err(DroneError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn malformed_json_is_invalid() {
        let catalog = ToolCatalog::standard(true);
        assert!(matches!(
            catalog.decode(&action("move", r#"{"direction":"#)),
            Err(DroneError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn unknown_name_is_a_contract_violation() {
        let catalog = ToolCatalog::standard(true);
        let err = catalog.decode(&action("barrel_roll", "{}")).unwrap_err();
        assert!(matches!(err, DroneError::UnknownAction(ref n) if n == "barrel_roll"));
        assert!(err.is_fatal());
    }

    #[test]
    fn known_kind_missing_from_catalog_is_a_contract_violation() {
        let catalog = ToolCatalog::with_kinds(&[ActionKind::TakeOff, ActionKind::Land], true);
        assert_eq!(catalog.len(), 2);
        assert!(matches!(
            catalog.decode(&action("move", r#"{"direction":"up","distance":1}"#)),
            Err(DroneError::UnknownAction(_))
        ));
    }
}
