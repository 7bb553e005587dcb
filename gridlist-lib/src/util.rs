//! String helpers shared across the pipeline.

/// Splits an HTML-style array name into its segments.
///
/// `"pivot[role][title]"` becomes `["pivot", "role", "title"]`; a name without
/// brackets is returned as a single segment.
pub(crate) fn name_to_array(name: &str) -> Vec<String> {
    let Some(open) = name.find('[') else {
        return vec![name.to_string()];
    };
    if open == 0 || !name.ends_with(']') {
        return vec![name.to_string()];
    }

    let mut segments = vec![name[..open].to_string()];
    let inner = &name[open + 1..name.len() - 1];
    segments.extend(inner.split("][").map(str::to_string));
    segments
}

/// Rebuilds a bracket path from segments: `["a", "b", "c"]` becomes `"a[b][c]"`.
pub(crate) fn array_to_name(segments: &[String]) -> String {
    let mut iter = segments.iter();
    let mut name = iter.next().cloned().unwrap_or_default();
    for segment in iter {
        name.push('[');
        name.push_str(segment);
        name.push(']');
    }
    name
}

/// Converts `release_date` or `release-date` to `ReleaseDate`.
pub(crate) fn studly_case(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts `MovieGallery` or `movieGallery` to `movie_gallery`.
pub(crate) fn snake_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for (i, c) in value.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '-' || c.is_whitespace() {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}
