use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(app) = expect_optional_object(root, "app")? {
        validate_optional_string_field(
            app,
            "app.company_name_default",
            "company_name_default",
        )?;
        validate_u64_field(
            app,
            "app.company_size_default",
            "company_size_default",
            1,
            1_000_000,
        )?;
        validate_u64_field(
            app,
            "app.max_description_length",
            "max_description_length",
            1,
            1_000_000,
        )?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.chat_model", "chat_model")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(directive) = expect_optional_object(root, "directive")? {
        validate_optional_string_field(directive, "directive.pdf_path", "pdf_path")?;
        validate_u64_field(directive, "directive.chunk_size", "chunk_size", 1, 100_000)?;
        validate_u64_field(
            directive,
            "directive.chunk_overlap",
            "chunk_overlap",
            0,
            100_000,
        )?;
        validate_u64_field(directive, "directive.top_k", "top_k", 1, 100)?;
        validate_u64_field(
            directive,
            "directive.max_context_chars",
            "max_context_chars",
            1,
            1_000_000,
        )?;
        validate_f64_field(
            directive,
            "directive.similarity_threshold",
            "similarity_threshold",
            -1.0,
            1.0,
        )?;
        validate_u64_field(
            directive,
            "directive.embed_batch_size",
            "embed_batch_size",
            1,
            2_048,
        )?;

        // overlap must leave a positive step
        let chunk_size = directive.get("chunk_size").and_then(|v| v.as_u64());
        let overlap = directive.get("chunk_overlap").and_then(|v| v.as_u64());
        if let (Some(size), Some(overlap)) = (chunk_size, overlap) {
            if overlap >= size {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'directive.chunk_overlap': must be smaller than chunk_size"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(report) = expect_optional_object(root, "report")? {
        validate_optional_string_field(report, "report.font_dir", "font_dir")?;
        validate_optional_string_field(report, "report.font_family", "font_family")?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_default_shape() {
        let config = crate::core::config::defaults::default_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let config = json!({
            "directive": { "chunk_size": 100, "chunk_overlap": 100 }
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_wrong_types() {
        let config = json!({ "llm": { "temperature": "hot" } });
        assert!(validate_config(&config).is_err());

        let config = json!({ "server": { "cors_allowed_origins": "nope" } });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_out_of_range_top_k() {
        let config = json!({ "directive": { "top_k": 0 } });
        assert!(validate_config(&config).is_err());
    }
}
