use recall_db::models::ItemContent;

use crate::error::ApiError;

/// Maximum length of a single tag
const MAX_TAG_LEN: usize = 64;

/// Normalize item content before it is stored
///
/// Prompt and answer are trimmed and must stay non-empty, a blank hint
/// becomes `None`, and tags are trimmed, deduplicated and sorted since
/// they form an unordered set.
///
/// # Examples
/// ```
/// use recall_api::validation::normalize_content;
/// use recall_db::models::ItemContent;
///
/// let content = ItemContent {
///     prompt: " hello ".into(),
///     answer: "hola".into(),
///     hint: Some("  ".into()),
///     tags: vec!["b".into(), " a".into(), "b".into()],
/// };
/// let content = normalize_content(content).unwrap();
/// assert_eq!(content.prompt, "hello");
/// assert_eq!(content.hint, None);
/// assert_eq!(content.tags, vec!["a", "b"]);
/// ```
pub fn normalize_content(content: ItemContent) -> Result<ItemContent, ApiError> {
    let prompt = content.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::Validation("Prompt cannot be empty".to_string()));
    }

    let answer = content.answer.trim().to_string();
    if answer.is_empty() {
        return Err(ApiError::Validation("Answer cannot be empty".to_string()));
    }

    let hint = content
        .hint
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    let mut tags = Vec::with_capacity(content.tags.len());
    for tag in content.tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(ApiError::Validation(format!(
                "Tag '{tag}' is longer than {MAX_TAG_LEN} characters"
            )));
        }
        tags.push(tag.to_string());
    }
    tags.sort();
    tags.dedup();

    Ok(ItemContent {
        prompt,
        answer,
        hint,
        tags,
    })
}
