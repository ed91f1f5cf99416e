use async_trait::async_trait;
use serde_json::json;

use orchestra_skill::{Result as SkillResult, Skill, SkillInput, SkillMetadata, SkillOutput};

use crate::error::Result;
use crate::skill_agent::SkillAgent;

pub const DEFAULT_RECALL_LIMIT: usize = 3;

/// Sample reference text on AI topics, one paragraph per subject
pub const AI_DOCUMENTS: &str = "
Artificial intelligence (AI) is intelligence demonstrated by machines, as opposed to natural intelligence displayed by animals including humans. AI research has been defined as the field of study of intelligent agents, which refers to any system that perceives its environment and takes actions that maximize its chance of achieving its goals.

Machine learning is a subset of artificial intelligence that focuses on the development of algorithms and statistical models that enable computer systems to improve their performance on a specific task through experience. Deep learning, a subset of machine learning, uses neural networks with multiple layers to progressively extract higher-level features from raw input.

Natural language processing (NLP) is a subfield of linguistics, computer science, and artificial intelligence concerned with the interactions between computers and human language. NLP is used to apply algorithms to identify and extract the natural language rules such that the unstructured language data is converted into a form that computers can understand.

Computer vision is an interdisciplinary scientific field that deals with how computers can gain high-level understanding from digital images or videos. From the perspective of engineering, it seeks to understand and automate tasks that the human visual system can do. Computer vision tasks include methods for acquiring, processing, analyzing and understanding digital images.

Reinforcement learning is an area of machine learning concerned with how intelligent agents ought to take actions in an environment in order to maximize the notion of cumulative reward. Reinforcement learning is one of three basic machine learning paradigms, alongside supervised learning and unsupervised learning.

Neural networks are computing systems inspired by the biological neural networks that constitute animal brains. Such systems learn to perform tasks by considering examples, generally without being programmed with task-specific rules. For instance, in image recognition, they might learn to identify images that contain cats by analyzing example images.

Generative AI refers to artificial intelligence systems capable of generating text, images, or other media in response to prompts. Generative AI models learn the patterns and structure of their input training data and then generate new data that has similar characteristics. Examples include large language models like GPT and image generation models like DALL-E.

The Transformer architecture is a neural network architecture that has become the foundation for many modern AI models. It uses self-attention mechanisms to process input data in parallel, making it highly efficient for tasks like language translation and text generation. Transformers have revolutionized natural language processing since their introduction in 2017.
";

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "an", "and", "are", "based", "between", "can", "compare", "contrast",
    "do", "does", "explain", "for", "how", "important", "in", "information", "is", "it", "me",
    "of", "on", "or", "tell", "the", "to", "what", "why", "with",
];

/// Paragraphs separated by blank lines, trimmed, empties dropped
pub fn split_into_paragraphs(text: &str) -> Vec<&str> {
    text.trim()
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Lower-cased query words worth searching for
fn search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .map(|w| w.trim_matches('-').to_lowercase())
    {
        if word.len() < 2 || STOP_WORDS.contains(&word.as_str()) || terms.contains(&word) {
            continue;
        }
        terms.push(word);
    }
    terms
}

/// Keyword recall over a fixed paragraph collection
pub struct DocumentRecallSkill {
    metadata: SkillMetadata,
    paragraphs: Vec<String>,
}

impl DocumentRecallSkill {
    pub fn new(documents: &str) -> Self {
        Self {
            metadata: SkillMetadata::new(
                "recall",
                "Recall reference paragraphs on AI topics: machine learning, NLP, vision, transformers",
            )
            .with_tags(vec!["documents", "recall"]),
            paragraphs: split_into_paragraphs(documents)
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Paragraphs sharing the most query terms, best first; ties keep
    /// document order
    pub fn recall(&self, query: &str, limit: usize) -> Vec<&str> {
        let terms = search_terms(query);
        let mut scored: Vec<(usize, usize)> = self
            .paragraphs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let lowered = p.to_lowercase();
                let hits = terms.iter().filter(|t| lowered.contains(t.as_str())).count();
                (hits > 0).then_some((hits, i))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, i)| self.paragraphs[i].as_str())
            .collect()
    }
}

impl Default for DocumentRecallSkill {
    fn default() -> Self {
        Self::new(AI_DOCUMENTS)
    }
}

#[async_trait]
impl Skill for DocumentRecallSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let query = input.require_text()?;
        let limit = input
            .option::<usize>("limit")?
            .unwrap_or(DEFAULT_RECALL_LIMIT)
            .max(1);

        let found = self.recall(query, limit);
        let text = if found.is_empty() {
            "No matching documents.".to_string()
        } else {
            found.join("\n\n")
        };
        Ok(SkillOutput::text(text).with_result("matches", json!(found.len())))
    }
}

/// Agent named `documents` owning the paragraph recall
pub fn documents_agent() -> Result<SkillAgent> {
    SkillAgent::builder("documents")
        .description("Reference documents on AI topics")
        .skill(DocumentRecallSkill::default())
        .build()
}
