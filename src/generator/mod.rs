//! README generation: one structured prompt, one completion call, all or
//! nothing. The session layer only ever sees [`GenerationUnavailable`];
//! the underlying cause goes to the log.

use crate::github::RepoMetadata;
use crate::providers::Provider;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("README generation is temporarily unavailable")]
pub struct GenerationUnavailable;

pub struct ReadmeGenerator {
    provider: Arc<dyn Provider>,
}

impl ReadmeGenerator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, repo: &RepoMetadata) -> Result<String, GenerationUnavailable> {
        let prompt = build_prompt(repo);

        let text = self.provider.generate(&prompt).await.map_err(|e| {
            tracing::warn!(repo = %repo.name, error = %e, "Gemini request failed");
            GenerationUnavailable
        })?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::warn!(repo = %repo.name, "Gemini returned an empty document");
            return Err(GenerationUnavailable);
        }

        Ok(trimmed.to_string())
    }
}

/// Build the generation prompt. Absent optional fields become explicit
/// placeholders so the model never sees a dangling label.
pub fn build_prompt(repo: &RepoMetadata) -> String {
    let description = repo.description.as_deref().unwrap_or("No description provided");
    let language = repo.language.as_deref().unwrap_or("Not specified");
    let topics = if repo.topics.is_empty() {
        "None".to_string()
    } else {
        repo.topics.join(", ")
    };
    let license = repo.license.as_deref().unwrap_or("Not specified");
    let homepage = repo.homepage.as_deref().unwrap_or("Not specified");

    format!(
        "You are an expert technical writer and software documentation specialist. \
Generate a comprehensive, professional README.md file for the following GitHub repository:

**Repository Details:**
- Name: {name}
- Owner: {owner}
- Description: {description}
- Primary Language: {language}
- Stars: {stars}
- Topics/Tags: {topics}
- License: {license}
- Homepage: {homepage}

**Requirements:**
Create a professional README with the following structure:

1. **Project Title** - Eye-catching with emojis
2. **Description** - Compelling project overview
3. **Features** - Key highlights and capabilities
4. **Technologies Used** - Tech stack with badges
5. **Installation** - Step-by-step setup instructions
6. **Usage** - Code examples and demonstrations
7. **API Documentation** - If applicable
8. **Contributing** - Guidelines for contributors
9. **License** - License information
10. **Contact** - Author/maintainer info

**Style Guidelines:**
- Use modern markdown formatting
- Include relevant emojis for visual appeal
- Add GitHub badges for technologies
- Provide clear, actionable instructions
- Include code examples where appropriate
- Make it scannable with proper headings
- Add a table of contents for longer READMEs

**Output Format:**
Provide only the markdown content, no additional text or explanations.",
        name = repo.name,
        owner = repo.owner,
        stars = repo.stars,
    )
}
