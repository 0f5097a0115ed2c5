//! 文档知识库 - 上传文档的索引与检索边界

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IngestionError;

mod index;
mod loader;

pub use index::{DocumentIndex, InMemoryKnowledgeStore};
pub use loader::{DocumentFormat, extract_text};

/// 待索引的原始文档
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// 从磁盘读取文档
    pub async fn from_path(path: &Path) -> Result<Self, IngestionError> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self { filename, bytes })
    }
}

/// 检索命中的文档片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// 来源文档名
    pub document: String,
    /// 片段在文档中的序号
    pub chunk_id: usize,
    /// 片段在原文中的字节偏移
    pub offset: usize,
    pub text: String,
    pub score: f64,
}

impl Passage {
    /// 供模型引用的片段标签
    pub fn label(&self) -> String {
        format!("[{}#{}]", self.document, self.chunk_id)
    }
}

/// 一份已索引文档的查询句柄
pub trait KnowledgeHandle: Send + Sync + Debug {
    /// 被索引的文档名
    fn document_name(&self) -> &str;

    /// 文档被切分出的片段数
    fn chunk_count(&self) -> usize;

    /// 检索与查询最相关的片段，按相关度降序排列，没有命中时返回空
    fn search(&self, query: &str, limit: usize) -> Vec<Passage>;

    /// 按原文顺序返回文档开头的片段
    fn leading(&self, limit: usize) -> Vec<Passage>;
}

/// 文档索引服务
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// 为单个文档建立全新的索引
    async fn ingest(&self, document: Document) -> Result<Arc<dyn KnowledgeHandle>, IngestionError>;
}
