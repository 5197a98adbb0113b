//! Prompt templates sent to the generative model

/// Fixed system instruction for every conversation
pub const SYSTEM_INSTRUCTION: &str = "You are a code generation assistant. \
You produce runnable, self-contained programs with helpful comments, always \
wrapped in a single markdown code fence with a language tag, followed by a \
short explanation.";

/// Wrap a free-text request in the generation instruction template
pub fn generation_prompt(request: &str) -> String {
    format!(
        r#"Generate code for the following requirement:
{request}

Keep the following in mind:
1. The code must be runnable and free of errors.
2. Include comments that make the code easy to follow.
3. Wrap the code in a markdown fence with a language tag (```python).
4. Add a short explanation of how the code works."#
    )
}

/// Build an improvement prompt embedding the current code and the feedback
pub fn improvement_prompt(code: &str, feedback: &str) -> String {
    format!(
        r#"Improve the following code:

```
{code}
```

Requested changes:
{feedback}

Provide the improved code in a markdown fence and describe what changed."#
    )
}
