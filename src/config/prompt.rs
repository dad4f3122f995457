//! System-instruction templates, one per generation mode, with the target
//! language substituted into the natural-language slots.

use crate::models::chat::GenerationMode;

const CODE_TEMPLATE: &str = "\
You are an expert AI code generator and programming assistant.
Your primary focus is generating high-quality, well-documented {language} code.

Guidelines:
- Write clean, efficient, and production-ready code
- Include helpful comments and docstrings
- Follow best practices and coding standards for {language}
- Provide explanations when necessary
- Format code properly with proper indentation
- When generating code, wrap it in markdown code blocks with the language specified
- Handle edge cases and add error handling where appropriate
- Be concise but thorough in explanations
";

const EXPLAIN_TEMPLATE: &str = "\
You are an expert programming tutor specializing in {language}.
Your role is to explain code, concepts, and help users understand programming topics.

Guidelines:
- Provide clear, educational explanations
- Break down complex concepts into understandable parts
- Use examples when helpful
- Encourage best practices
- Be patient and thorough
";

const CHAT_TEMPLATE: &str = "\
You are a helpful AI programming assistant.
You can discuss programming concepts, help with debugging, and provide general programming advice.
When discussing {language}, be specific and accurate.

Guidelines:
- Be conversational and helpful
- Provide code examples when relevant
- Offer multiple solutions when applicable
- Be honest about limitations
";

const ROADMAP_TEMPLATE: &str = "\
You are a curriculum designer for {language} learners.
When asked for a roadmap, learning path, or study plan, respond ONLY with a JSON
document containing a title, a description, and an ordered list of modules.
Each module has an id, title, description, 3-6 topics, a duration, a difficulty
of Beginner, Intermediate or Advanced, and a list of prerequisite module ids.
Wrap the JSON in a ```json code block and add no other text.
";

/// Strict-JSON generation prompt used by the roadmap generator. The topic is
/// substituted in both raw and title-cased forms.
const ROADMAP_JSON_TEMPLATE: &str = r#"Generate a comprehensive learning roadmap for: {topic}

You MUST return ONLY valid JSON with NO extra text, following this EXACT structure:

{
  "title": "Complete {topic_title} Learning Path",
  "description": "A comprehensive guide to mastering {topic}",
  "modules": [
    {
      "id": 1,
      "title": "Getting Started with {topic_title}",
      "description": "Introduction and fundamentals",
      "topics": ["Basic concepts", "Setup and installation", "First steps"],
      "duration": "2 weeks",
      "difficulty": "Beginner",
      "prerequisites": []
    },
    {
      "id": 2,
      "title": "Intermediate Concepts",
      "description": "Building on the basics",
      "topics": ["Advanced features", "Best practices", "Common patterns"],
      "duration": "3 weeks",
      "difficulty": "Intermediate",
      "prerequisites": [1]
    }
  ]
}

CRITICAL RULES:
1. Return ONLY the JSON object, nothing else
2. Create 5-8 modules with logical progression
3. Each module must have 3-6 specific, practical topics
4. Difficulty MUST be exactly: "Beginner", "Intermediate", or "Advanced"
5. Duration should be realistic (1-4 weeks per module)
6. Prerequisites array contains module IDs (use [] for first modules)
7. Make titles and descriptions specific to {topic}
8. Use double quotes for all strings
9. Do NOT wrap in ```json code blocks
10. Do NOT add any explanatory text

Return pure JSON only."#;

const CODE_GENERATION_TEMPLATE: &str = "\
You are an expert {language} code generator.
Generate clean, efficient, and production-ready code based on user requirements.

Requirements:
- Write {language} code only
- {comments_clause}
- {tests_clause}
- Follow {language} best practices and conventions
- Handle edge cases and errors appropriately
- Format code with proper indentation
- Wrap code in markdown code blocks with language specified
";

/// System instruction for the given mode. Total over the mode enum; an
/// unrecognized mode string is rejected earlier, by `GenerationMode::from_str`.
pub fn system_prompt(mode: GenerationMode, language: &str) -> String {
    let template = match mode {
        GenerationMode::Code => CODE_TEMPLATE,
        GenerationMode::Explain => EXPLAIN_TEMPLATE,
        GenerationMode::Chat => CHAT_TEMPLATE,
        GenerationMode::Roadmap => ROADMAP_TEMPLATE,
    };
    template.replace("{language}", language)
}

pub fn roadmap_prompt(topic: &str) -> String {
    ROADMAP_JSON_TEMPLATE
        .replace("{topic_title}", &title_case(topic))
        .replace("{topic}", topic)
}

pub fn code_generation_prompt(
    language: &str,
    include_comments: bool,
    include_tests: bool
) -> String {
    let comments_clause = if include_comments {
        "Include helpful comments and docstrings"
    } else {
        "Minimize comments, focus on code"
    };
    let tests_clause = if include_tests { "Include unit tests" } else { "No tests needed" };

    CODE_GENERATION_TEMPLATE
        .replace("{language}", language)
        .replace("{comments_clause}", comments_clause)
        .replace("{tests_clause}", tests_clause)
}

pub fn title_case(text: &str) -> String {
    text
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_substituted_per_mode() {
        let code = system_prompt(GenerationMode::Code, "go");
        assert!(code.contains("well-documented go code"));

        let explain = system_prompt(GenerationMode::Explain, "rust");
        assert!(explain.contains("tutor specializing in rust"));

        let chat = system_prompt(GenerationMode::Chat, "python");
        assert!(chat.contains("When discussing python"));

        let roadmap = system_prompt(GenerationMode::Roadmap, "java");
        assert!(roadmap.contains("curriculum designer for java"));
    }

    #[test]
    fn roadmap_prompt_interpolates_topic() {
        let prompt = roadmap_prompt("machine learning");
        assert!(prompt.contains("roadmap for: machine learning"));
        assert!(prompt.contains("Complete Machine Learning Learning Path"));
        assert!(prompt.contains("Return pure JSON only."));
    }

    #[test]
    fn code_generation_prompt_reflects_flags() {
        let with = code_generation_prompt("python", true, true);
        assert!(with.contains("Include helpful comments"));
        assert!(with.contains("Include unit tests"));

        let without = code_generation_prompt("python", false, false);
        assert!(without.contains("Minimize comments"));
        assert!(without.contains("No tests needed"));
    }

    #[test]
    fn title_case_capitalizes_words() {
        assert_eq!(title_case("machine learning"), "Machine Learning");
        assert_eq!(title_case("rust"), "Rust");
    }
}
