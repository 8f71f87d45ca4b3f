use serde_json::Value;

pub fn format_risk(risk_score: f64) -> String {
    format!("{:.0}%", (risk_score * 100.0).round())
}

pub fn format_metadata_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn formats_risk_as_percentage() {
        assert_eq!(format_risk(0.0), "0%");
        assert_eq!(format_risk(0.72), "72%");
        assert_eq!(format_risk(1.0), "100%");
    }

    #[test]
    fn metadata_strings_render_without_quotes() {
        assert_eq!(format_metadata_value(&json!("visa-4521")), "visa-4521");
        assert_eq!(format_metadata_value(&json!(12500.5)), "12500.5");
        assert_eq!(format_metadata_value(&json!(null)), "-");
        assert_eq!(format_metadata_value(&json!(["a", "b"])), "[\"a\",\"b\"]");
    }
}
