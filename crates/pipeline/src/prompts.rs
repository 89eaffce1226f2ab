//! Prompt templates for answer generation
//!
//! PRIVATE MODULE - Not exported from crate

pub const ANSWER_SYSTEM: &str = include_str!("../assets/prompts/answer_system.txt");

pub const ANSWER_USER: &str = include_str!("../assets/prompts/answer_user.txt");

pub fn format_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prompt() {
        let template = "Context: {context}\nQuestion: {question}";
        let vars = [("context", "[Source: a] text"), ("question", "why?")];
        let result = format_prompt(template, &vars);
        assert_eq!(result, "Context: [Source: a] text\nQuestion: why?");
    }

    #[test]
    #[allow(clippy::len_zero)] // const_is_empty conflicts with len_zero for const strings
    fn test_prompts_load() {
        assert!(ANSWER_SYSTEM.len() > 0);
        assert!(ANSWER_SYSTEM.contains("[Source: <id>]"));
        assert!(ANSWER_USER.contains("{context}"));
        assert!(ANSWER_USER.contains("{question}"));
    }
}
