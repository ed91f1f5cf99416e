use async_trait::async_trait;

use orchestra_skill::{Result as SkillResult, Skill, SkillInput, SkillMetadata, SkillOutput};

use crate::error::Result;
use crate::skill_agent::SkillAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportTopic {
    pub key: &'static str,
    pub topic: &'static str,
    pub info: &'static str,
    pub cost: Option<&'static str>,
    pub process: Option<&'static str>,
    pub details: Option<&'static str>,
}

impl SupportTopic {
    fn matches(&self, query: &str) -> bool {
        query.contains(self.key)
            || self
                .topic
                .to_lowercase()
                .split_whitespace()
                .any(|word| query.contains(word))
    }

    fn render(&self) -> String {
        let mut out = format!("Topic: {}\nInformation: {}\n", self.topic, self.info);
        if let Some(cost) = self.cost {
            out.push_str(&format!("Cost: {}\n", cost));
        }
        if let Some(process) = self.process {
            out.push_str(&format!("Process: {}\n", process));
        }
        if let Some(details) = self.details {
            out.push_str(&format!("Details: {}\n", details));
        }
        out
    }
}

pub const SUPPORT_TOPICS: [SupportTopic; 3] = [
    SupportTopic {
        key: "shipping",
        topic: "Shipping Information",
        info: "Standard shipping takes 3-5 business days. Express shipping is 1-2 days.",
        cost: Some("Standard: $5.99, Express: $15.99"),
        process: None,
        details: None,
    },
    SupportTopic {
        key: "returns",
        topic: "Return Policy",
        info: "Returns accepted within 30 days of purchase with original packaging.",
        cost: None,
        process: Some("Contact support with order number to initiate return."),
        details: None,
    },
    SupportTopic {
        key: "warranty",
        topic: "Warranty Coverage",
        info: "All products come with 1-year manufacturer warranty.",
        cost: None,
        process: None,
        details: Some("Extended warranty available for purchase at checkout."),
    },
];

/// Customer support knowledge base: shipping, returns, warranty
pub struct SupportKbSkill {
    metadata: SkillMetadata,
}

impl SupportKbSkill {
    pub fn new() -> Self {
        Self {
            metadata: SkillMetadata::new(
                "search_support_kb",
                "Customer support questions: shipping, returns, warranty and policies",
            )
            .with_tags(vec!["support", "policy"]),
        }
    }

    pub fn search(query: &str) -> String {
        let query = query.to_lowercase();
        match SUPPORT_TOPICS.iter().find(|t| t.matches(&query)) {
            Some(topic) => topic.render(),
            None => {
                let topics: Vec<String> = SUPPORT_TOPICS
                    .iter()
                    .map(|t| format!("- {}", t.topic))
                    .collect();
                format!("Available Support Topics:\n{}", topics.join("\n"))
            }
        }
    }
}

impl Default for SupportKbSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for SupportKbSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let query = input.require_text()?;
        Ok(SkillOutput::text(Self::search(query)))
    }
}

/// Agent named `support` owning the knowledge-base search
pub fn support_agent() -> Result<SkillAgent> {
    SkillAgent::builder("support")
        .description("Customer support knowledge base: shipping, returns, warranty")
        .skill(SupportKbSkill::new())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_word_matches_singular_form() {
        assert_eq!(
            SupportKbSkill::search("What's your return policy?"),
            "Topic: Return Policy\n\
             Information: Returns accepted within 30 days of purchase with original packaging.\n\
             Process: Contact support with order number to initiate return.\n"
        );
    }

    #[test]
    fn includes_cost_for_shipping() {
        let out = SupportKbSkill::search("How long does SHIPPING take?");
        assert!(out.starts_with("Topic: Shipping Information\n"));
        assert!(out.ends_with("Cost: Standard: $5.99, Express: $15.99\n"));
    }

    #[test]
    fn warranty_has_details() {
        let out = SupportKbSkill::search("is there a warranty");
        assert!(out.contains("Details: Extended warranty available for purchase at checkout.\n"));
    }

    #[test]
    fn lists_topics_without_a_match() {
        assert_eq!(
            SupportKbSkill::search("can I pay in cash?"),
            "Available Support Topics:\n- Shipping Information\n- Return Policy\n- Warranty Coverage"
        );
    }
}
