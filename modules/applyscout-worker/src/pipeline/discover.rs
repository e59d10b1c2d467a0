use anyhow::Result;

use applyscout_common::{Config, QueryBatch, RankedResult, SearchPreferences};

use crate::query::build_queries;
use crate::ranker::merge_results;
use crate::search::SearchProvider;
use crate::store::{JobStore, NewLead, PreferenceProfile};

/// Counters for one discovery run across all profiles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub profiles: usize,
    pub queries_run: usize,
    pub queries_failed: usize,
    pub candidates: usize,
    pub leads_created: usize,
    pub tasks_enqueued: usize,
    pub skipped_duplicates: usize,
    pub skipped_existing_task: usize,
}

/// Company-name separators tried in order, most specific first.
const COMPANY_SEPARATORS: [&str; 4] = [" at ", " @ ", " - ", " | "];

/// Pull a company name out of a posting title like
/// "Senior Engineer at Acme" or "Backend Developer | Acme Corp".
/// When a separator repeats, the company is the last segment.
pub fn extract_company_from_title(title: &str) -> String {
    for sep in COMPANY_SEPARATORS {
        if let Some((_, company)) = title.rsplit_once(sep) {
            let company = company.trim();
            if !company.is_empty() {
                return company.to_string();
            }
        }
    }
    "Unknown".to_string()
}

/// Merge profile keywords with resume-derived keywords, first
/// occurrence wins.
fn to_search_preferences(profile: &PreferenceProfile) -> SearchPreferences {
    let mut include = profile.keywords.clone();
    for keyword in &profile.resume_keywords {
        if !include.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            include.push(keyword.clone());
        }
    }

    SearchPreferences {
        title: profile.title.clone(),
        location: profile.location.clone(),
        salary_min: profile.min_salary,
        remote_ok: profile.remote_ok,
        include_keywords: include,
        exclude_keywords: Vec::new(),
    }
}

async fn persist_leads(
    store: &dyn JobStore,
    profile: &PreferenceProfile,
    candidates: Vec<RankedResult>,
    stats: &mut DiscoveryStats,
) -> Result<()> {
    for candidate in candidates {
        let existing = store
            .find_lead_by_hash(profile.id, &candidate.dedupe_hash)
            .await?;

        let lead = match existing {
            Some(lead) => {
                stats.skipped_duplicates += 1;
                lead
            }
            None => {
                let lead = store
                    .insert_lead(NewLead {
                        profile_id: profile.id,
                        url: candidate.url.clone(),
                        dedupe_hash: candidate.dedupe_hash.clone(),
                        title: candidate.title.clone(),
                        company: extract_company_from_title(&candidate.title),
                        score: candidate.score,
                        sources: candidate.sources.clone(),
                    })
                    .await?;
                stats.leads_created += 1;
                tracing::info!(
                    profile = %profile.email,
                    url = %lead.url,
                    score = lead.score,
                    "New lead"
                );
                lead
            }
        };

        // A lead found again after its task was created is fully handled;
        // a lead without a task (e.g. interrupted earlier run) still gets one.
        if store.lead_has_task(lead.id).await? {
            stats.skipped_existing_task += 1;
        } else {
            store.enqueue_task(lead.id, profile.id).await?;
            stats.tasks_enqueued += 1;
        }
    }
    Ok(())
}

/// One full discovery pass: for every preference profile, build queries,
/// fan out to the search provider, merge and rank the hits, then persist
/// above-threshold candidates as leads with queued apply tasks.
///
/// Individual query failures are logged and skipped; a profile with no
/// usable title is skipped entirely.
pub async fn run_discovery(
    store: &dyn JobStore,
    searcher: &dyn SearchProvider,
    config: &Config,
) -> Result<DiscoveryStats> {
    let started = std::time::Instant::now();
    let mut stats = DiscoveryStats::default();
    let profiles = store.load_profiles().await?;
    tracing::info!(profiles = profiles.len(), "Starting discovery run");

    for profile in profiles {
        let prefs = to_search_preferences(&profile);
        let queries = build_queries(&prefs);
        if queries.is_empty() {
            tracing::warn!(profile = %profile.email, "Profile has no job title, skipping");
            continue;
        }
        stats.profiles += 1;

        let mut batches = Vec::with_capacity(queries.len());
        for query in queries {
            stats.queries_run += 1;
            match searcher.search(&query).await {
                Ok(results) => {
                    tracing::debug!(query = %query, hits = results.len(), "Query done");
                    batches.push(QueryBatch { query, results });
                }
                Err(error) => {
                    stats.queries_failed += 1;
                    tracing::warn!(query = %query, error = %error, "Query failed, continuing");
                }
            }
        }

        let candidates: Vec<RankedResult> = merge_results(batches, config.multi_query_bonus)
            .into_iter()
            .filter(|r| r.score >= config.score_threshold)
            .take(config.max_leads)
            .collect();
        stats.candidates += candidates.len();

        persist_leads(store, &profile, candidates, &mut stats).await?;
    }

    tracing::info!(
        profiles = stats.profiles,
        leads_created = stats.leads_created,
        tasks_enqueued = stats.tasks_enqueued,
        queries_failed = stats.queries_failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Discovery run complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_is_extracted_from_common_title_shapes() {
        assert_eq!(extract_company_from_title("Senior Engineer at Acme"), "Acme");
        assert_eq!(extract_company_from_title("Engineer @ Acme Corp"), "Acme Corp");
        assert_eq!(extract_company_from_title("Engineer - Acme"), "Acme");
        assert_eq!(extract_company_from_title("Engineer | Acme"), "Acme");
    }

    #[test]
    fn first_matching_separator_wins() {
        assert_eq!(
            extract_company_from_title("Engineer at Acme - Berlin"),
            "Acme - Berlin"
        );
    }

    #[test]
    fn repeated_separator_takes_the_last_segment() {
        assert_eq!(extract_company_from_title("VP - Sales - Acme"), "Acme");
        assert_eq!(
            extract_company_from_title("Engineer at Scale at Acme"),
            "Acme"
        );
    }

    #[test]
    fn titles_without_separator_are_unknown() {
        assert_eq!(extract_company_from_title("Senior Rust Engineer"), "Unknown");
        assert_eq!(extract_company_from_title(""), "Unknown");
    }

    #[test]
    fn resume_keywords_merge_without_case_duplicates() {
        let mut profile = crate::testing::make_profile("a@example.com");
        profile.keywords = vec!["Rust".to_string(), "grpc".to_string()];
        profile.resume_keywords = vec!["rust".to_string(), "tokio".to_string()];

        let prefs = to_search_preferences(&profile);
        assert_eq!(prefs.include_keywords, vec!["Rust", "grpc", "tokio"]);
    }
}
