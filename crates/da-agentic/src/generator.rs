//! Definition Generator
//!
//! Uses an LLM (OpenAI or Anthropic) to draft a formal definition for a
//! begrip, given its organisational/legal context and optionally feedback
//! from an earlier validation round.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use toets_core::keywords::category_keywords;
use toets_core::ValidationContext;

use crate::client_factory::{create_llm_client, create_llm_client_with_key};
use crate::feedback::FeedbackItem;
use crate::llm_client::{LlmClient, TokenUsage};

/// One generated candidate: the definition text, its illustrative examples,
/// and what the call cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDefinition {
    pub definitie: String,
    /// Illustrative examples for the begrip. Generated once on the first
    /// iteration and carried over verbatim on regeneration.
    pub voorbeelden: Vec<String>,
    pub usage: TokenUsage,
}

/// Definition generator using an LLM API
pub struct DefinitionGenerator {
    client: Arc<dyn LlmClient>,
}

/// Raw JSON shape the model is asked to return.
#[derive(Debug, Deserialize)]
struct RawDefinition {
    definitie: String,
    #[serde(default)]
    voorbeelden: Vec<String>,
}

impl DefinitionGenerator {
    /// Create a new generator with explicit API key
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: create_llm_client_with_key(api_key)?,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: create_llm_client()?,
        })
    }

    /// Create with a specific LLM client
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Generate the first candidate, including illustrative examples.
    pub async fn generate(&self, ctx: &ValidationContext) -> Result<GeneratedDefinition> {
        let system_prompt = self.build_system_prompt(ctx);
        let user_prompt = self.build_user_prompt(ctx, None, &[]);

        let response = self
            .client
            .chat_json(&system_prompt, &user_prompt)
            .await
            .context("definition generation call failed")?;

        let raw = parse_definition(&response.text)?;
        debug!(begrip = %ctx.begrip, "generated initial definition candidate");
        Ok(GeneratedDefinition {
            definitie: raw.definitie,
            voorbeelden: raw.voorbeelden,
            usage: response.usage,
        })
    }

    /// Regenerate with feedback from the previous validation round.
    ///
    /// The previous candidate's examples are reused, not regenerated; the
    /// model is only asked for a corrected definition text.
    pub async fn regenerate(
        &self,
        ctx: &ValidationContext,
        previous: &GeneratedDefinition,
        feedback: &[FeedbackItem],
    ) -> Result<GeneratedDefinition> {
        let system_prompt = self.build_system_prompt(ctx);
        let user_prompt = self.build_user_prompt(ctx, Some(previous), feedback);

        let response = self
            .client
            .chat_json(&system_prompt, &user_prompt)
            .await
            .context("definition regeneration call failed")?;

        let raw = parse_definition(&response.text)?;
        debug!(begrip = %ctx.begrip, "regenerated definition candidate");
        Ok(GeneratedDefinition {
            definitie: raw.definitie,
            voorbeelden: previous.voorbeelden.clone(),
            usage: response.usage,
        })
    }

    fn build_system_prompt(&self, ctx: &ValidationContext) -> String {
        let mut prompt = String::from(
            r#"Je bent een definitiespecialist voor Nederlandse overheidsorganisaties.
Je schrijft formele definities van begrippen volgens deze regels:

1. De definitie is precies één volzin van ten minste vijf woorden.
2. Begin met het kernzelfstandignaamwoord, nooit met een lidwoord of hulpwerkwoord.
3. Beschrijf WAT het begrip is, nooit het doel ervan (geen "om te", "met als doel").
4. Gebruik het begrip zelf niet in de definitietekst.
5. Noem een kenmerk dat het begrip onderscheidt van verwante begrippen.
6. Geen voorbeelden, opsommingen of verwijzingen naar artikelen in de definitietekst.
7. Formuleer organisatie- en tijdsonafhankelijk.
"#,
        );

        match ctx.categorie_marker {
            Some(categorie) => {
                prompt.push_str(&format!(
                    "\nHet begrip is een {}. Formuleer de definitie passend bij die ontologische categorie.\n",
                    categorie
                ));
            }
            None => {
                prompt.push_str(
                    "\nMaak uit de formulering duidelijk tot welke ontologische categorie het begrip behoort:\n",
                );
                for (categorie, words) in category_keywords() {
                    prompt.push_str(&format!(
                        "- {}: herkenbaar aan woorden als {}\n",
                        categorie,
                        words.join(", ")
                    ));
                }
                prompt.push_str("Kies precies één categorie; meng geen categorieën.\n");
            }
        }

        prompt.push_str(
            r#"
Antwoord uitsluitend met JSON in deze vorm:
{"definitie": "<de definitiezin>", "voorbeelden": ["<voorbeeld 1>", "<voorbeeld 2>"]}
"#,
        );
        prompt
    }

    fn build_user_prompt(
        &self,
        ctx: &ValidationContext,
        previous: Option<&GeneratedDefinition>,
        feedback: &[FeedbackItem],
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("## Begrip\n{}\n\n", ctx.begrip));

        if let Some(org) = &ctx.organisatorische_context {
            prompt.push_str(&format!("## Organisatorische context\n{}\n\n", org));
        }
        if let Some(jur) = &ctx.juridische_context {
            prompt.push_str(&format!("## Juridische context\n{}\n\n", jur));
        }

        match previous {
            None => {
                prompt.push_str(
                    "Schrijf de definitie en geef twee korte illustratieve voorbeelden.\n",
                );
            }
            Some(prev) => {
                prompt.push_str(&format!(
                    "## Vorige poging\n{}\n\n## Verbeterpunten\n",
                    prev.definitie
                ));
                for item in feedback {
                    prompt.push_str(&format!("- [{}] {}\n", item.code, item.message));
                }
                prompt.push_str(
                    "\nSchrijf een verbeterde definitie. De voorbeelden zijn al vastgesteld; \
                     laat \"voorbeelden\" leeg.\n",
                );
            }
        }

        prompt
    }
}

/// Extract and parse the model's JSON answer, tolerating code fences.
fn parse_definition(text: &str) -> Result<RawDefinition> {
    let clean = extract_json(text);
    let raw: RawDefinition = serde_json::from_str(clean.trim())
        .map_err(|e| anyhow!("failed to parse definition JSON: {}\n\nJSON was:\n{}", e, clean))?;
    if raw.definitie.trim().is_empty() {
        return Err(anyhow!("model returned an empty definition"));
    }
    Ok(raw)
}

fn extract_json(text: &str) -> &str {
    let text = text.trim();
    if let Some(rest) = text.split("```json").nth(1) {
        return rest.split("```").next().unwrap_or(text);
    }
    if text.starts_with("```") {
        if let Some(inner) = text.split("```").nth(1) {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let raw = parse_definition(
            r#"{"definitie": "besluit waarmee toestemming wordt verleend", "voorbeelden": ["kapvergunning"]}"#,
        )
        .unwrap();
        assert_eq!(raw.definitie, "besluit waarmee toestemming wordt verleend");
        assert_eq!(raw.voorbeelden, vec!["kapvergunning"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = parse_definition(
            "```json\n{\"definitie\": \"besluit van een bevoegd gezag\"}\n```",
        )
        .unwrap();
        assert_eq!(raw.definitie, "besluit van een bevoegd gezag");
        assert!(raw.voorbeelden.is_empty());
    }

    #[test]
    fn test_empty_definition_rejected() {
        assert!(parse_definition(r#"{"definitie": "  "}"#).is_err());
    }

    #[test]
    fn test_system_prompt_mentions_marker() {
        let generator = DefinitionGenerator::with_client(std::sync::Arc::new(
            crate::openai_client::OpenAiClient::with_model("k".into(), "gpt-4o"),
        ));
        let ctx = ValidationContext::for_begrip("vergunning")
            .with_marker(toets_core::OntologicalCategory::Proces);
        let prompt = generator.build_system_prompt(&ctx);
        assert!(prompt.contains("proces"));
        // With a marker there is no need for the keyword guidance table.
        assert!(!prompt.contains("herkenbaar aan woorden als"));
    }

    #[test]
    fn test_user_prompt_includes_feedback() {
        let generator = DefinitionGenerator::with_client(std::sync::Arc::new(
            crate::openai_client::OpenAiClient::with_model("k".into(), "gpt-4o"),
        ));
        let ctx = ValidationContext::for_begrip("vergunning");
        let previous = GeneratedDefinition {
            definitie: "de toestemming om te bouwen".to_string(),
            voorbeelden: vec!["kapvergunning".to_string()],
            usage: TokenUsage::default(),
        };
        let feedback = vec![FeedbackItem {
            kind: crate::feedback::FeedbackKind::Critical,
            code: "ESS-01".to_string(),
            message: "Beschrijf WAT het begrip is.".to_string(),
        }];
        let prompt = generator.build_user_prompt(&ctx, Some(&previous), &feedback);
        assert!(prompt.contains("ESS-01"));
        assert!(prompt.contains("Vorige poging"));
    }
}
