use applyscout_common::SearchPreferences;

const MIN_QUERIES: usize = 3;
const MAX_QUERIES: usize = 6;

/// Build 3–6 diverse search queries from a preference profile, ordered
/// broad → narrow:
///
///  1. Discovery     – title only (maximum recall)
///  2. Geographic    – title + location / remote
///  3. Skill-targeted – title + include keywords
///  4. Combined      – title + keywords + location
///  5. Compensation  – title + salary + location
///  6. Precision     – all constraints, with exclusions (minimum recall)
///
/// Returns an empty vec when the title is blank. Output is deterministic
/// for identical input.
pub fn build_queries(prefs: &SearchPreferences) -> Vec<String> {
    let title = prefs.title.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() {
        return Vec::new();
    }

    let location = prefs
        .location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let remote = prefs.remote_ok;
    let salary = prefs.salary_min;
    let include: Vec<&str> = prefs
        .include_keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    let exclude: Vec<&str> = prefs
        .exclude_keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    let mut queries = Vec::new();

    // Layer 1 — discovery (broadest)
    queries.push(format!("{title} job openings hiring now"));

    // Layer 2 — location/remote scoped
    match (location, remote) {
        (Some(loc), true) => queries.push(format!("{title} jobs in {loc} OR remote")),
        (Some(loc), false) => queries.push(format!("{title} jobs in {loc}")),
        (None, true) => queries.push(format!("{title} remote jobs")),
        (None, false) => {}
    }

    // Layer 3 — skill-targeted
    if !include.is_empty() {
        let skills = include[..include.len().min(4)].join(" ");
        queries.push(format!("{title} {skills} job postings"));
    }

    // Layer 4 — location + skills combined
    if (location.is_some() || remote) && !include.is_empty() {
        let skills = include[..include.len().min(3)].join(" ");
        let loc = match (location, remote) {
            (Some(l), true) => format!("{l} remote"),
            (Some(l), false) => l.to_string(),
            (None, _) => "remote".to_string(),
        };
        queries.push(format!("{title} {skills} jobs {loc}"));
    }

    // Layer 5 — compensation-focused
    if let Some(salary) = salary {
        let mut q = format!("{title} jobs salary above ${salary}");
        if let Some(loc) = location {
            q.push(' ');
            q.push_str(loc);
        }
        if remote {
            q.push_str(" remote");
        }
        queries.push(q);
    }

    // Layer 6 — precision (narrowest, includes exclusions)
    let mut parts = vec![title.to_string()];
    if !include.is_empty() {
        parts.push(include[..include.len().min(3)].join(" "));
    }
    if let Some(loc) = location {
        parts.push(loc.to_string());
    }
    if remote {
        parts.push("remote".to_string());
    }
    if let Some(salary) = salary {
        parts.push(format!("${salary}+"));
    }
    if !exclude.is_empty() {
        parts.push(
            exclude
                .iter()
                .map(|k| format!("-{k}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    queries.push(format!("{} job listing", parts.join(" ")));

    // Pad to the minimum with alternative phrasings
    if queries.len() < MIN_QUERIES {
        queries.push(format!("{title} careers opportunities apply"));
    }
    if queries.len() < MIN_QUERIES {
        queries.push(format!("hiring {title} open positions"));
    }

    // Deduplicate (order preserved) and cap
    let mut seen = std::collections::HashSet::new();
    queries.retain(|q| seen.insert(q.clone()));
    queries.truncate(MAX_QUERIES);
    queries
}
