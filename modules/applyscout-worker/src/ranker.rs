use std::collections::HashMap;

use applyscout_common::{QueryBatch, RankedResult};
use sha2::{Digest, Sha256};
use url::Url;

/// Canonicalize a URL for deduplication: drop the fragment, strip tracking
/// query params (`utm_*`, `ref`, `source`, case-insensitive), lowercase
/// scheme and host. Unparseable URLs fall back to the trimmed input.
pub fn canonicalize_url(raw: &str) -> String {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.trim().to_string(),
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            !(key.starts_with("utm_") || key == "ref" || key == "source")
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        url.set_query(Some(&query));
    }

    url.to_string()
}

/// SHA-256 of the canonical URL, hex-encoded. The dedup key across the
/// entire merge, independent of which query produced the result.
pub fn dedupe_hash(canonical_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hex::encode(hasher.finalize())
}

fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

struct MergeEntry {
    title: String,
    url: String,
    content: String,
    best_score: f64,
    sources: Vec<String>,
}

/// Merge results from multiple query batches into one deduplicated, ranked
/// list, sorted descending by score with ascending title as tiebreaker.
///
/// - Scores are clamped to [0, 1]; missing scores count as 0.
/// - Duplicate canonical URLs collapse to the highest score seen; title and
///   content are only replaced by a higher-scoring occurrence.
/// - Each additional corroborating query adds `multi_query_bonus` to the
///   best score, capped at 1.0.
pub fn merge_results(batches: Vec<QueryBatch>, multi_query_bonus: f64) -> Vec<RankedResult> {
    let mut merged: HashMap<String, MergeEntry> = HashMap::new();

    for batch in &batches {
        for result in &batch.results {
            if result.url.is_empty() {
                continue;
            }

            let url = canonicalize_url(&result.url);
            let hash = dedupe_hash(&url);
            let score = clamp_score(result.score.unwrap_or(0.0));

            match merged.entry(hash) {
                std::collections::hash_map::Entry::Occupied(mut occupied) => {
                    let entry = occupied.get_mut();
                    if score > entry.best_score {
                        entry.best_score = score;
                        if !result.title.is_empty() {
                            entry.title = result.title.clone();
                        }
                        if !result.content.is_empty() {
                            entry.content = result.content.clone();
                        }
                    }
                    if !entry.sources.contains(&batch.query) {
                        entry.sources.push(batch.query.clone());
                    }
                }
                std::collections::hash_map::Entry::Vacant(vacant) => {
                    vacant.insert(MergeEntry {
                        title: if result.title.is_empty() {
                            "Untitled".to_string()
                        } else {
                            result.title.clone()
                        },
                        url,
                        content: result.content.clone(),
                        best_score: score,
                        sources: vec![batch.query.clone()],
                    });
                }
            }
        }
    }

    let mut ranked: Vec<RankedResult> = merged
        .into_iter()
        .map(|(hash, entry)| {
            let bonus = multi_query_bonus * (entry.sources.len() as f64 - 1.0);
            let score = clamp_score(entry.best_score + bonus);
            RankedResult {
                title: entry.title,
                url: entry.url,
                content: entry.content,
                score: (score * 1000.0).round() / 1000.0,
                sources: entry.sources,
                dedupe_hash: hash,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.title.cmp(&b.title))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use applyscout_common::RawSearchResult;

    const BONUS: f64 = 0.05;

    fn result(url: &str, score: Option<f64>) -> RawSearchResult {
        RawSearchResult {
            title: format!("Job at {url}"),
            url: url.to_string(),
            content: "description".to_string(),
            score,
        }
    }

    fn batch(query: &str, results: Vec<RawSearchResult>) -> QueryBatch {
        QueryBatch {
            query: query.to_string(),
            results,
        }
    }

    #[test]
    fn strips_tracking_params_and_fragment() {
        let canonical =
            canonicalize_url("https://Example.com/jobs/1?utm_source=x&ref=feed&page=2#apply");
        assert_eq!(canonical, "https://example.com/jobs/1?page=2");
    }

    #[test]
    fn drops_query_entirely_when_only_tracking_params() {
        let canonical = canonicalize_url("https://example.com/jobs/1?utm_campaign=a&source=b");
        assert_eq!(canonical, "https://example.com/jobs/1");
    }

    #[test]
    fn unparseable_url_falls_back_to_trimmed_input() {
        assert_eq!(canonicalize_url("  not a url  "), "not a url");
    }

    #[test]
    fn hash_is_64_hex_chars_and_deterministic() {
        let a = dedupe_hash("https://example.com/jobs/1");
        let b = dedupe_hash("https://example.com/jobs/1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, dedupe_hash("https://example.com/jobs/2"));
    }

    #[test]
    fn scores_are_clamped_into_unit_interval() {
        let batches = vec![batch(
            "q",
            vec![
                result("https://a.com/1", Some(7.5)),
                result("https://a.com/2", Some(-3.0)),
                result("https://a.com/3", None),
                result("https://a.com/4", Some(f64::NAN)),
            ],
        )];

        for r in merge_results(batches, BONUS) {
            assert!((0.0..=1.0).contains(&r.score), "score {} out of range", r.score);
        }
    }

    #[test]
    fn duplicate_across_batches_keeps_best_score_plus_bonus() {
        // Same posting found by two queries at 0.6 and 0.85 → 0.85 + 0.05 = 0.9
        let batches = vec![
            batch("q1", vec![result("https://a.com/1", Some(0.6))]),
            batch("q2", vec![result("https://a.com/1?utm_source=x", Some(0.85))]),
        ];

        let ranked = merge_results(batches, BONUS);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.9);
        assert_eq!(ranked[0].sources, vec!["q1", "q2"]);
    }

    #[test]
    fn three_occurrences_at_same_score_gain_two_bonuses() {
        let batches = vec![
            batch("q1", vec![result("https://a.com/1", Some(0.7))]),
            batch("q2", vec![result("https://a.com/1", Some(0.7))]),
            batch("q3", vec![result("https://a.com/1", Some(0.7))]),
        ];

        let ranked = merge_results(batches, BONUS);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.8);
    }

    #[test]
    fn bonus_never_pushes_score_above_one() {
        let batches = vec![
            batch("q1", vec![result("https://a.com/1", Some(0.99))]),
            batch("q2", vec![result("https://a.com/1", Some(0.99))]),
            batch("q3", vec![result("https://a.com/1", Some(0.99))]),
        ];

        assert_eq!(merge_results(batches, BONUS)[0].score, 1.0);
    }

    #[test]
    fn empty_urls_are_skipped() {
        let batches = vec![batch("q", vec![result("", Some(0.9))])];
        assert!(merge_results(batches, BONUS).is_empty());
    }

    #[test]
    fn title_and_content_follow_the_higher_score() {
        let low = RawSearchResult {
            title: "Low".to_string(),
            url: "https://a.com/1".to_string(),
            content: "low content".to_string(),
            score: Some(0.3),
        };
        let high = RawSearchResult {
            title: "High".to_string(),
            url: "https://a.com/1".to_string(),
            content: "high content".to_string(),
            score: Some(0.8),
        };

        let ranked = merge_results(vec![batch("q1", vec![low]), batch("q2", vec![high])], BONUS);
        assert_eq!(ranked[0].title, "High");
        assert_eq!(ranked[0].content, "high content");
    }

    #[test]
    fn sorted_by_score_desc_then_title_asc() {
        let mut a = result("https://a.com/1", Some(0.5));
        a.title = "Bravo".to_string();
        let mut b = result("https://a.com/2", Some(0.5));
        b.title = "Alpha".to_string();
        let mut c = result("https://a.com/3", Some(0.9));
        c.title = "Zulu".to_string();

        let ranked = merge_results(vec![batch("q", vec![a, b, c])], BONUS);
        let titles: Vec<&str> = ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Zulu", "Alpha", "Bravo"]);
    }

    #[test]
    fn missing_title_becomes_untitled() {
        let r = RawSearchResult {
            title: String::new(),
            url: "https://a.com/1".to_string(),
            content: String::new(),
            score: Some(0.5),
        };
        let ranked = merge_results(vec![batch("q", vec![r])], BONUS);
        assert_eq!(ranked[0].title, "Untitled");
    }

    #[test]
    fn score_rounds_to_three_decimals() {
        let batches = vec![
            batch("q1", vec![result("https://a.com/1", Some(0.333_333))]),
            batch("q2", vec![result("https://a.com/1", Some(0.333_333))]),
        ];
        assert_eq!(merge_results(batches, BONUS)[0].score, 0.383);
    }
}
