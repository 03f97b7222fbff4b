use locator::ReferenceHeightTable;

/// Metadata key under which Ultralytics exports store the class names.
pub const NAMES_METADATA_KEY: &str = "names";

/// Parse the `names` metadata of an Ultralytics export, a Python dict repr
/// such as `{0: 'person', 1: '120'}`, into names ordered by class id.
///
/// Returns `None` when the string is not a dict of integer keys to quoted
/// strings, or when the ids are not exactly `0..n`.
pub fn parse_ultralytics_names(raw: &str) -> Option<Vec<String>> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = body.chars().peekable();
    let mut entries: Vec<(usize, String)> = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            key.push(c);
        }
        let id: usize = key.parse().ok()?;

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next()? != ':' {
            return None;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let quote = chars.next().filter(|c| *c == '\'' || *c == '"')?;
        let mut name = String::new();
        loop {
            match chars.next()? {
                '\\' => name.push(chars.next()?),
                c if c == quote => break,
                c => name.push(c),
            }
        }
        entries.push((id, name));
    }

    entries.sort_by_key(|(id, _)| *id);
    if entries.iter().enumerate().any(|(i, (id, _))| i != *id) {
        return None;
    }
    Some(entries.into_iter().map(|(_, name)| name).collect())
}

/// Pick the detector's class names: explicit override, then the names
/// embedded in the model, then the height table keys in ascending height.
pub fn resolve_class_names(
    configured: Option<&[String]>,
    embedded: Option<&str>,
    heights: &ReferenceHeightTable,
) -> Vec<String> {
    if let Some(names) = configured {
        tracing::info!(count = names.len(), "Using configured detector labels");
        return names.to_vec();
    }

    match embedded.map(|raw| (raw, parse_ultralytics_names(raw))) {
        Some((_, Some(names))) => {
            tracing::info!(count = names.len(), "Using detector labels from model metadata");
            return names;
        }
        Some((raw, None)) => {
            tracing::warn!(metadata = raw, "Model names metadata is not understood");
        }
        None => {}
    }

    tracing::warn!(
        "No detector labels configured or embedded in the model, \
         assuming class ids follow the reference height table"
    );
    heights.classes_by_height()
}
