//! Scripted in-process provider for tests. Returns canned chat replies in
//! order and deterministic embeddings derived from the input text, so
//! similarity-based assertions are stable without a live endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<String>>>,
    chat_calls: Arc<Mutex<Vec<(String, ChatRequest)>>>,
    embed_calls: Arc<Mutex<usize>>,
}

impl ScriptedProvider {
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            chat_calls: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn chat_calls(&self) -> Vec<(String, ChatRequest)> {
        self.chat_calls.lock().unwrap().clone()
    }

    pub fn embed_call_count(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }

    /// 8-dimensional bag-of-characters embedding. Texts sharing vocabulary
    /// land close together under cosine similarity.
    pub fn embedding_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize + i) % 8] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((model_id.to_string(), request));

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Internal("scripted provider ran out of replies".to_string()))
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        *self.embed_calls.lock().unwrap() += 1;
        Ok(inputs.iter().map(|s| Self::embedding_for(s)).collect())
    }
}
