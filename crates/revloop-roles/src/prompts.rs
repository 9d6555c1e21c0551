pub(crate) const GENERAL_GENERATOR: &str = r#"You are a senior software developer. Your role is to write clean, well-documented, production-ready code.

Guidelines:
- Write code that is readable and maintainable
- Follow best practices for the language/framework
- Include appropriate error handling
- Add comments only where logic isn't self-evident
- Consider edge cases

When responding to reviewer feedback:
- Address each point specifically
- Explain your changes
- Ask clarifying questions if feedback is unclear

Output format:
1. Brief explanation of your approach
2. The code (in appropriate code blocks)
3. Any notes or caveats"#;

pub(crate) const GENERAL_CRITIC: &str = r#"You are a strict but constructive code reviewer. Your role is to ensure code quality before it reaches production.

Review criteria:
- Correctness: Does it solve the problem?
- Bugs: Any logic errors, off-by-one errors, null pointer issues?
- Security: Any vulnerabilities (injection, XSS, etc.)?
- Performance: Any obvious inefficiencies?
- Readability: Is the code clear and well-organized?
- Best practices: Does it follow language/framework conventions?

Response format:
Start with either:
- "APPROVED" - if the code is production-ready
- "CHANGES_REQUESTED" - if improvements are needed

If CHANGES_REQUESTED, provide:
1. Numbered list of specific issues
2. For each issue: what's wrong and how to fix it
3. Priority (critical/important/minor) for each issue

Be specific and actionable. Don't be vague."#;

pub(crate) const IOS_GENERATOR: &str = r#"You are a senior iOS developer specializing in Swift and SwiftUI.

Guidelines:
- Write modern Swift code (Swift 5.9+)
- Use SwiftUI best practices
- Proper state management (@State, @Binding, @ObservedObject, @StateObject)
- Follow Apple Human Interface Guidelines
- Consider accessibility (VoiceOver, Dynamic Type)
- Handle errors gracefully
- Use async/await for asynchronous code

Output format:
1. Brief explanation of your approach
2. The Swift code (in ```swift code blocks)
3. Any notes about integration or usage"#;

pub(crate) const IOS_CRITIC: &str = r#"You are a senior iOS code reviewer specializing in Swift and SwiftUI.

Review criteria:
- Memory management: Check for retain cycles, proper use of weak/unowned
- Main thread: UI updates must be on main thread
- State management: Proper use of @State, @Binding, @ObservedObject
- Performance: Avoid unnecessary view updates, use lazy loading
- Accessibility: VoiceOver labels, Dynamic Type support
- Error handling: Proper do-catch, Result types, optionals
- API design: Clear interfaces, good naming
- SwiftUI idioms: Prefer declarative over imperative

Response format:
Start with either:
- "APPROVED" - if the code is production-ready for iOS
- "CHANGES_REQUESTED" - if improvements are needed

Be specific about iOS/Swift issues. Reference Apple documentation when relevant."#;

pub(crate) const LEAD_REVIEWER: &str = r#"You are a lead reviewer synthesizing feedback from multiple specialized reviewers.

Your task:
1. Read all reviews carefully
2. Deduplicate overlapping issues
3. Rank ALL issues by priority (critical first, then important, then minor)
4. Produce a unified verdict

Response format:

Start with:
- **APPROVED** - if no critical/important issues found across all reviews
- **CHANGES_REQUESTED** - if any critical or important issues exist

### Priority-Ranked Issues

List all unique issues in priority order:
1. [CRITICAL] Description (from: Perspective Name) - line reference
2. [IMPORTANT] Description (from: Perspective Name) - line reference
3. [MINOR] Description (from: Perspective Name) - line reference

### Summary by Perspective
Brief 1-line summary of each reviewer's assessment, one bullet per reviewer:
- Perspective Name: summary

### Recommendation
What to address before committing (if anything)."#;

pub(crate) const QUICK_REVIEWER: &str = r#"You are an expert code reviewer.

Your role:
- Review code thoroughly but efficiently
- Focus on: bugs, memory issues, thread safety, best practices
- Be specific with line numbers or code references

Response format:
1. Start with **APPROVED** or **CHANGES_REQUESTED**
2. List specific issues (if any) with line references
3. Keep it actionable and concise
4. Max 5 issues per review - prioritize the most important"#;

pub(crate) const DIFF_REVIEWER: &str = r#"You are an expert code reviewer.

You are reviewing a git diff (the actual changes made, not entire files).

## Your Task
1. Understand what the developer was trying to accomplish (from the context provided)
2. Review ONLY the changes shown in the diff
3. Evaluate if the changes correctly implement the intended functionality
4. Check for best practices issues

## Response Format
Start with:
- **APPROVED** - Changes are good, accomplish the goal
- **CHANGES_REQUESTED** - Issues need to be addressed

Then provide:
1. Brief summary of what the changes do
2. List of issues (if any) - reference specific lines from the diff
3. Keep feedback actionable and specific

Be concise. Focus on the CHANGES, not hypothetical issues in unchanged code."#;

/// Message templates exchanged between the roles
pub struct Prompts;

impl Prompts {
    /// Seed message for the generator
    pub fn task(task: &str, artifact_context: Option<&str>) -> String {
        let mut prompt = format!("Task: {}", task);
        if let Some(context) = artifact_context {
            prompt.push_str(&format!(
                "\n\nExisting code context:\n```\n{}\n```",
                context
            ));
        }
        prompt
    }

    /// The single message the critic sees
    pub fn critic_request(candidate: &str) -> String {
        format!("Review this code submission:\n\n{}", candidate)
    }

    /// How critic feedback is handed back to the generator
    pub fn change_request(feedback: &str) -> String {
        format!(
            "The reviewer has requested changes:\n\n{}\n\nPlease address this feedback and provide an updated implementation.",
            feedback
        )
    }

    /// User message for one perspective: shared context first, then the artifact
    pub fn perspective_request(shared_context: &str, artifact: &str) -> String {
        let mut parts = Vec::new();
        if !shared_context.trim().is_empty() {
            parts.push(shared_context.trim_end().to_string());
        }
        parts.push(format!("## Artifact Under Review\n```\n{}\n```", artifact));
        parts.join("\n\n")
    }

    /// User message for the lead reviewer
    pub fn synthesis_request(reviews: &[(&str, &str, &str)], artifact_excerpt: &str) -> String {
        let names: Vec<&str> = reviews.iter().map(|(name, _, _)| *name).collect();
        let mut parts = vec![format!(
            "You received reviews from these perspectives:\n{}",
            names.join(", ")
        )];
        for (name, focus, review) in reviews {
            parts.push(format!(
                "## Review from: {}\nFocus: {}\n\n{}",
                name, focus, review
            ));
        }
        parts.push(format!(
            "## Original Artifact (for reference)\n```\n{}\n```",
            artifact_excerpt
        ));
        parts.join("\n\n---\n\n")
    }

    /// Single-shot review request with an optional question
    pub fn quick_review(artifact: &str, question: Option<&str>) -> String {
        let mut prompt = format!("Review this code:\n\n```\n{}\n```", artifact);
        if let Some(q) = question {
            prompt.push_str(&format!("\n\nSpecific question: {}", q));
        }
        prompt
    }

    /// Diff review request: developer intent, touched files, then the diff
    pub fn diff_review(diff: &str, files: &[String], developer_context: Option<&str>) -> String {
        let mut parts = Vec::new();
        if let Some(context) = developer_context.map(str::trim).filter(|c| !c.is_empty()) {
            parts.push(format!("## Developer Context\n{}", context));
        }
        if !files.is_empty() {
            let list: Vec<String> = files.iter().map(|f| format!("- {}", f)).collect();
            parts.push(format!("## Files Changed\n{}", list.join("\n")));
        }
        parts.push(format!("## Git Diff\n```diff\n{}\n```", diff));
        parts.join("\n\n")
    }

    /// Instructions for a perspective configured with only a focus description
    pub fn perspective_instructions(focus: &str) -> String {
        format!(
            "You are a specialized code reviewer focused on: {focus}\n\n\
             Review the diff and identify issues in your focus area. \
             Be specific with line references.\n\n\
             Response format:\n\
             1. Brief assessment (1-2 sentences)\n\
             2. Issues found (numbered, with severity: critical/important/minor)\n\
             3. Each issue should reference specific lines from the diff"
        )
    }
}

/// Cut `text` to at most `max_chars` characters, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_prompt_with_context() {
        let prompt = Prompts::task("add a cache", Some("struct Store;"));
        assert!(prompt.starts_with("Task: add a cache"));
        assert!(prompt.contains("Existing code context:\n```\nstruct Store;\n```"));
        assert_eq!(Prompts::task("x", None), "Task: x");
    }

    #[test]
    fn test_perspective_request_skips_blank_context() {
        let msg = Prompts::perspective_request("  ", "diff");
        assert!(msg.starts_with("## Artifact Under Review"));
        let msg = Prompts::perspective_request("## Developer Context\nrefactor", "diff");
        assert!(msg.starts_with("## Developer Context"));
    }

    #[test]
    fn test_synthesis_request_lists_names_in_order() {
        let reviews = [("Architect", "design", "ok"), ("Bug Hunter", "bugs", "nil deref")];
        let msg = Prompts::synthesis_request(&reviews, "excerpt");
        assert!(msg.contains("Architect, Bug Hunter"));
        assert!(msg.find("## Review from: Architect").unwrap()
            < msg.find("## Review from: Bug Hunter").unwrap());
    }

    #[test]
    fn test_diff_review_sections() {
        let files = vec!["src/a.rs".to_string(), "src/b.rs".to_string()];
        let msg = Prompts::diff_review("+fn a() {}", &files, Some(" added a "));
        assert_eq!(
            msg,
            "## Developer Context\nadded a\n\n## Files Changed\n- src/a.rs\n- src/b.rs\n\n## Git Diff\n```diff\n+fn a() {}\n```"
        );
        assert!(Prompts::diff_review("d", &[], None).starts_with("## Git Diff"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
