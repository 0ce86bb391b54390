// ==========================================
// 脚本化推理服务桩
// ==========================================
// 按顺序返回预置应答; 脚本耗尽后返回连接错误
// ==========================================

use async_trait::async_trait;
use shift_downtime_ledger::reasoning::{ReasoningBackend, ReasoningError, ReasoningPrompt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<Result<String, ReasoningError>>>,
    prompts: Mutex<Vec<ReasoningPrompt>>,
}

impl ScriptedBackend {
    pub fn new(name: &str, replies: Vec<Result<String, ReasoningError>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// 始终失败（连接错误）
    pub fn unreachable(name: &str) -> Arc<Self> {
        Self::new(name, Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<ReasoningPrompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &ReasoningPrompt) -> Result<String, ReasoningError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ReasoningError::Connection("connection refused".to_string())))
    }
}
