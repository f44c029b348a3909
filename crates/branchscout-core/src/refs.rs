//! Branch reference normalization

/// Ref namespace prefix carried by push payloads.
const HEADS_PREFIX: &str = "refs/heads/";

/// Malformed doubled namespace left on some tag-triggered payloads after the
/// plain prefix is stripped.
const DOUBLED_TAGS_MARKER: &str = "refs/heads/tags";

/// Strip the ref namespace from a raw branch reference.
///
/// Removes one occurrence of `refs/heads/`, then one occurrence of
/// `refs/heads/tags`, in that order. Absent and empty input pass through
/// unchanged: callers may legitimately supply them (a push payload with no
/// pull-request field populated, say), and skipping is the reconciler's
/// decision, not the normalizer's.
pub fn clean_branch_ref(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    Some(
        raw.replacen(HEADS_PREFIX, "", 1)
            .replacen(DOUBLED_TAGS_MARKER, "", 1),
    )
}
