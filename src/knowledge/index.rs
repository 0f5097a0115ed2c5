use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use text_splitter::{ChunkConfig, TextSplitter};
use uuid::Uuid;

use super::loader::{DocumentFormat, extract_text};
use super::{Document, KnowledgeHandle, KnowledgeStore, Passage};
use crate::config::KnowledgeConfig;
use crate::error::IngestionError;

/// BM25参数
const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.75;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "its",
    "of", "on", "or", "that", "the", "this", "to", "was", "were", "will", "with",
];

const CJK_STOP_CHARS: &[char] = &['的', '了', '和', '是', '在', '与', '及', '或', '之', '其'];

/// 进程内的文档知识库，每次ingest都会生成独立的索引
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeStore {
    config: KnowledgeConfig,
}

impl InMemoryKnowledgeStore {
    pub fn new(config: KnowledgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn ingest(&self, document: Document) -> Result<Arc<dyn KnowledgeHandle>, IngestionError> {
        let format = DocumentFormat::from_filename(&document.filename)?;
        let config = self.config.clone();

        // PDF解析与切分都是CPU密集操作
        let index = tokio::task::spawn_blocking(move || {
            let text = extract_text(format, &document.bytes)?;
            DocumentIndex::build(&document.filename, &text, &config)
        })
        .await
        .map_err(|e| IngestionError::Io(std::io::Error::other(e)))??;

        tracing::info!(
            document = %index.name,
            index_id = %index.id,
            chunks = index.chunks.len(),
            "文档索引构建完成"
        );

        Ok(Arc::new(index))
    }
}

#[derive(Debug)]
struct IndexedChunk {
    offset: usize,
    text: String,
    term_counts: HashMap<String, usize>,
    length: usize,
}

/// 单个文档的BM25倒排统计
#[derive(Debug)]
pub struct DocumentIndex {
    id: Uuid,
    name: String,
    chunks: Vec<IndexedChunk>,
    document_frequency: HashMap<String, usize>,
    average_length: f64,
}

impl DocumentIndex {
    /// 切分文本并建立索引
    pub fn build(name: &str, text: &str, config: &KnowledgeConfig) -> Result<Self, IngestionError> {
        if text.trim().is_empty() {
            return Err(IngestionError::EmptyDocument(name.to_string()));
        }
        if config.min_chunk_size >= config.max_chunk_size {
            return Err(IngestionError::Chunking(format!(
                "min_chunk_size({}) 必须小于 max_chunk_size({})",
                config.min_chunk_size, config.max_chunk_size
            )));
        }

        let chunk_config = ChunkConfig::new(config.min_chunk_size..config.max_chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| IngestionError::Chunking(e.to_string()))?;

        let chunks: Vec<IndexedChunk> = TextSplitter::new(chunk_config)
            .chunk_indices(text)
            .map(|(offset, chunk)| {
                let terms = tokenize(chunk);
                let length = terms.len();
                let mut term_counts = HashMap::new();
                for term in terms {
                    *term_counts.entry(term).or_insert(0) += 1;
                }
                IndexedChunk {
                    offset,
                    text: chunk.to_string(),
                    term_counts,
                    length,
                }
            })
            .collect();

        let mut document_frequency = HashMap::new();
        for chunk in &chunks {
            for term in chunk.term_counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let total_length: usize = chunks.iter().map(|c| c.length).sum();
        let average_length = if chunks.is_empty() {
            0.0
        } else {
            total_length as f64 / chunks.len() as f64
        };

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            chunks,
            document_frequency,
            average_length,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn passage(&self, chunk_id: usize, score: f64) -> Passage {
        let chunk = &self.chunks[chunk_id];
        Passage {
            document: self.name.clone(),
            chunk_id,
            offset: chunk.offset,
            text: chunk.text.clone(),
            score,
        }
    }

    fn score(&self, chunk: &IndexedChunk, query_terms: &HashSet<String>) -> f64 {
        let total = self.chunks.len() as f64;
        let length_norm = if self.average_length > 0.0 {
            chunk.length as f64 / self.average_length
        } else {
            1.0
        };

        query_terms
            .iter()
            .filter_map(|term| {
                let tf = *chunk.term_counts.get(term)? as f64;
                let df = *self.document_frequency.get(term)? as f64;
                let idf = ((total - df + 0.5) / (df + 0.5) + 1.0).ln();
                Some(idf * tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * (1.0 - BM25_B + BM25_B * length_norm)))
            })
            .sum()
    }
}

impl KnowledgeHandle for DocumentIndex {
    fn document_name(&self) -> &str {
        &self.name
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn search(&self, query: &str, limit: usize) -> Vec<Passage> {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, self.score(chunk, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(i, score)| self.passage(i, score))
            .collect()
    }

    fn leading(&self, limit: usize) -> Vec<Passage> {
        (0..self.chunks.len().min(limit))
            .map(|i| self.passage(i, 0.0))
            .collect()
    }
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}'
        | '\u{F900}'..='\u{FAFF}')
}

/// 分词：拉丁文字按单词切分并转小写，中日韩文字按相邻二字切分，单独的字保留为一个词
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut run: Vec<char> = Vec::new();

    for ch in text.chars() {
        if is_cjk(ch) {
            flush_word(&mut word, &mut tokens);
            if CJK_STOP_CHARS.contains(&ch) {
                flush_run(&mut run, &mut tokens);
            } else {
                run.push(ch);
            }
        } else {
            flush_run(&mut run, &mut tokens);
            if ch.is_alphanumeric() {
                word.extend(ch.to_lowercase());
            } else {
                flush_word(&mut word, &mut tokens);
            }
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_run(&mut run, &mut tokens);

    tokens
}

fn flush_run(run: &mut Vec<char>, tokens: &mut Vec<String>) {
    match run.as_slice() {
        [] => {}
        [single] => tokens.push(single.to_string()),
        chars => tokens.extend(chars.windows(2).map(|pair| pair.iter().collect::<String>())),
    }
    run.clear();
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    if word.chars().count() > 1 && !STOP_WORDS.contains(&word.as_str()) {
        tokens.push(std::mem::take(word));
    } else {
        word.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> KnowledgeConfig {
        KnowledgeConfig {
            max_chunk_size: 120,
            min_chunk_size: 40,
            chunk_overlap: 0,
            top_k: 3,
        }
    }

    const LEASE: &str = "Section 1. Rent. The tenant shall pay monthly rent of 2,000 dollars on the first day of each month.\n\n\
Section 2. Indemnification. The tenant shall indemnify the landlord against all claims arising from the tenant's use of the premises.\n\n\
Section 3. Termination. Either party may terminate this lease with sixty days written notice.";

    #[test]
    fn test_tokenize_latin_and_cjk() {
        let tokens = tokenize("The Tenant's RENT 合同的违约");
        assert_eq!(tokens, vec!["tenant", "rent", "合同", "违约"]);

        assert_eq!(tokenize("解除合同"), vec!["解除", "除合", "合同"]);
        assert_eq!(tokenize("甲的乙"), vec!["甲", "乙"]);
    }

    #[test]
    fn test_cjk_search_matches_words_not_shared_characters() {
        let config = KnowledgeConfig {
            max_chunk_size: 32,
            min_chunk_size: 10,
            chunk_overlap: 0,
            top_k: 3,
        };
        let text = "第一条 乙方应按月支付租金。\n\n第二条 本合同自双方签字之日起生效。";
        let index = DocumentIndex::build("租赁合同.txt", text, &config).unwrap();
        assert_eq!(index.chunk_count(), 2);

        let passages = index.search("租金支付", 2);
        assert_eq!(passages.len(), 1);
        assert!(passages[0].text.contains("租金"));
    }

    #[test]
    fn test_build_rejects_empty_text() {
        let result = DocumentIndex::build("empty.txt", "   \n ", &small_config());
        assert!(matches!(result, Err(IngestionError::EmptyDocument(_))));
    }

    #[test]
    fn test_build_rejects_inverted_chunk_range() {
        let config = KnowledgeConfig {
            max_chunk_size: 100,
            min_chunk_size: 100,
            ..small_config()
        };
        let result = DocumentIndex::build("lease.txt", LEASE, &config);
        assert!(matches!(result, Err(IngestionError::Chunking(_))));
    }

    #[test]
    fn test_search_ranks_matching_section_first() {
        let index = DocumentIndex::build("lease.txt", LEASE, &small_config()).unwrap();
        assert!(index.chunk_count() >= 3);

        let passages = index.search("indemnify claims", 2);
        assert!(!passages.is_empty());
        assert!(passages[0].text.contains("indemnify"));
        assert_eq!(passages[0].document, "lease.txt");
        assert!(passages.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_without_matches_is_empty() {
        let index = DocumentIndex::build("lease.txt", LEASE, &small_config()).unwrap();
        assert!(index.search("arbitration venue", 5).is_empty());
        assert!(index.search("the of and", 5).is_empty());
        assert!(index.search("rent", 0).is_empty());
    }

    #[test]
    fn test_leading_follows_document_order() {
        let index = DocumentIndex::build("lease.txt", LEASE, &small_config()).unwrap();
        let passages = index.leading(2);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].chunk_id, 0);
        assert_eq!(passages[0].offset, 0);
        assert!(index.leading(0).is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let index = DocumentIndex::build("lease.txt", LEASE, &small_config()).unwrap();
        let passages = index.search("tenant", 1);
        assert_eq!(passages.len(), 1);
    }

    #[test]
    fn test_search_is_deterministic() {
        let index = DocumentIndex::build("lease.txt", LEASE, &small_config()).unwrap();
        assert_eq!(index.search("tenant lease", 3), index.search("tenant lease", 3));
    }

    #[tokio::test]
    async fn test_ingest_builds_independent_indexes() {
        let store = InMemoryKnowledgeStore::new(small_config());

        let first = store
            .ingest(Document::new("lease.txt", LEASE.as_bytes()))
            .await
            .unwrap();
        let second = store
            .ingest(Document::new(
                "nda.md",
                "# Confidentiality\n\nThe recipient must keep all disclosed information secret for five years.",
            ))
            .await
            .unwrap();

        assert!(!first.search("indemnify", 3).is_empty());
        assert!(second.search("indemnify", 3).is_empty());
        assert_eq!(second.document_name(), "nda.md");
    }

    #[tokio::test]
    async fn test_ingest_unsupported_format() {
        let store = InMemoryKnowledgeStore::default();
        let result = store.ingest(Document::new("scan.png", vec![0u8; 4])).await;
        assert!(matches!(result, Err(IngestionError::UnsupportedFormat(_))));
    }
}
