//! Fenced code-block extraction
//!
//! Model responses mix prose with markdown-fenced code. Only the first fence
//! pair is used; anything malformed degrades to "no block found" so callers
//! can fall back to treating the whole response as code.

/// A code block pulled out of a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the opening fence, if one was given
    pub language: Option<String>,
    /// The block body, trimmed of surrounding whitespace
    pub source: String,
}

/// Extract the first triple-backtick fenced block from `text`.
///
/// The opening fence may carry a language tag on the same line; the tag (its
/// first whitespace-separated token) is captured. Returns `None` when there
/// is no opening fence, no closing fence, the fence line never ends (no
/// newline after the tag), or the block body is empty after trimming.
pub fn extract_code_block(text: &str) -> Option<CodeBlock> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];

    // The fence line must end; a tag with no following newline is malformed
    let newline = after_open.find('\n')?;
    let tag_line = after_open[..newline].trim();

    let body = &after_open[newline + 1..];
    let close = body.find("```")?;
    let source = body[..close].trim();

    if source.is_empty() {
        return None;
    }

    let language = tag_line
        .split_whitespace()
        .next()
        .map(|t| t.to_ascii_lowercase());

    Some(CodeBlock {
        language,
        source: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_block_with_language_tag() {
        let text = "Here you go:\n```python\nprint('hello')\n```\nThat prints hello.";
        let block = extract_code_block(text).unwrap();
        assert_eq!(block.language.as_deref(), Some("python"));
        assert_eq!(block.source, "print('hello')");
    }

    #[test]
    fn test_extracts_block_without_language_tag() {
        let text = "```\nx = 1\ny = 2\n```";
        let block = extract_code_block(text).unwrap();
        assert_eq!(block.language, None);
        assert_eq!(block.source, "x = 1\ny = 2");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let text = "```python\n\n  print('hi')  \n\n```";
        let block = extract_code_block(text).unwrap();
        assert_eq!(block.source, "print('hi')");
    }

    #[test]
    fn test_no_fence_returns_none() {
        assert!(extract_code_block("just prose, no code here").is_none());
    }

    #[test]
    fn test_unterminated_fence_returns_none() {
        assert!(extract_code_block("```python\nprint('hi')").is_none());
    }

    #[test]
    fn test_fence_without_newline_returns_none() {
        // The tag line never ends, so there is no block to take
        assert!(extract_code_block("text ```python").is_none());
        assert!(extract_code_block("```abc```").is_none());
    }

    #[test]
    fn test_empty_block_returns_none() {
        assert!(extract_code_block("```python\n\n```").is_none());
    }

    #[test]
    fn test_first_pair_wins() {
        let text = "```python\nfirst()\n```\nand then\n```python\nsecond()\n```";
        let block = extract_code_block(text).unwrap();
        assert_eq!(block.source, "first()");
    }

    #[test]
    fn test_language_tag_is_first_token_lowercased() {
        let text = "```Python title=example\ncode()\n```";
        let block = extract_code_block(text).unwrap();
        assert_eq!(block.language.as_deref(), Some("python"));
    }
}
