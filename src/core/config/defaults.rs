use serde_json::{json, Value};

/// Built-in configuration. `config.yml` and `secrets.yaml` are merged on top.
pub fn default_config() -> Value {
    json!({
        "app": {
            "company_name_default": "Entreprise XYZ",
            "company_size_default": 20,
            "max_description_length": 8000
        },
        "server": {
            "host": "127.0.0.1",
            "cors_allowed_origins": []
        },
        "llm": {
            "base_url": "https://api.openai.com",
            "chat_model": "gpt-4o-mini",
            "embedding_model": "text-embedding-3-small",
            "temperature": 0.2,
            "max_tokens": 2048,
            "request_timeout_secs": 120
        },
        "directive": {
            "pdf_path": "directive-cfst.pdf",
            "chunk_size": 1000,
            "chunk_overlap": 100,
            "top_k": 4,
            "max_context_chars": 6000,
            "similarity_threshold": 0.1,
            "embed_batch_size": 32
        },
        "report": {
            "font_dir": "/usr/share/fonts/truetype/liberation",
            "font_family": "LiberationSans"
        }
    })
}
