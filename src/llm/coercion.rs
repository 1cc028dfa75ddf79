use serde_json::{Map, Value};

/// Coerce a string argument into the JSON type its schema declares.
///
/// Models frequently quote numbers and booleans in tool arguments. Only
/// string inputs are touched; anything that fails to parse is returned
/// unchanged so the action (or the schema check) can report it.
#[must_use]
pub fn coerce_value(value: &Value, target_type: &str) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };

    let coerced = match target_type {
        "number" => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "integer" => s.trim().parse::<i64>().ok().map(Value::from),
        "boolean" => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(Value::Bool(true)),
            "false" | "0" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        "null" => matches!(s.trim(), "" | "null").then_some(Value::Null),
        "array" | "object" => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|parsed| match target_type {
                "array" => parsed.is_array(),
                _ => parsed.is_object(),
            }),
        _ => None,
    };

    coerced.unwrap_or_else(|| value.clone())
}

/// Coerce every top-level argument against the `properties` of an
/// action's input schema. Keys without a declared `type` pass through.
#[must_use]
pub fn coerce_arguments(args: &Value, input_schema: &Value) -> Value {
    let (Some(args_obj), Some(props)) = (
        args.as_object(),
        input_schema.get("properties").and_then(Value::as_object),
    ) else {
        return args.clone();
    };

    let coerced: Map<String, Value> = args_obj
        .iter()
        .map(|(key, value)| {
            let target_type = props
                .get(key)
                .and_then(|prop| prop.get("type"))
                .and_then(Value::as_str);
            let value = match target_type {
                Some(target_type) => coerce_value(value, target_type),
                None => value.clone(),
            };
            (key.clone(), value)
        })
        .collect();

    Value::Object(coerced)
}
