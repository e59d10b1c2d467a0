use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use url::Url;

/// Known applicant-tracking-system root domains. Request hostnames equal
/// to, or a subdomain of, one of these collapse to the root, so
/// `boards.greenhouse.io` and `acme.greenhouse.io` share one throttle slot.
const ATS_ROOTS: [&str; 8] = [
    "greenhouse.io",
    "lever.co",
    "myworkdayjobs.com",
    "smartrecruiters.com",
    "ashbyhq.com",
    "icims.com",
    "jobvite.com",
    "breezy.hr",
];

/// Extract the effective domain from a URL: lowercased hostname with the
/// port stripped, collapsed to a known ATS root where applicable.
/// Unparseable or empty URLs map to the sentinel `"unknown"`.
pub fn extract_domain(url: &str) -> String {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
        Some(host) => host,
        None => return "unknown".to_string(),
    };

    for root in ATS_ROOTS {
        if host == root || host.ends_with(&format!(".{root}")) {
            return root.to_string();
        }
    }
    host
}

/// Result of one throttled dispatch.
#[derive(Debug)]
pub struct Throttled {
    pub domain: String,
    pub waited_ms: u64,
}

/// In-memory per-domain rate limiter. Tracks the last request timestamp
/// for each effective domain and enforces a minimum interval between
/// consecutive requests to the same domain.
///
/// Each domain gets its own lock, held across the check-sleep-record
/// sequence: overlapping calls to one domain serialize (preserving the
/// minimum-interval guarantee), while calls to distinct domains never
/// block each other.
pub struct DomainThrottle {
    min_interval_ms: u64,
    domains: Mutex<HashMap<String, Arc<Mutex<Option<u64>>>>>,
}

impl DomainThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            domains: Mutex::new(HashMap::new()),
        }
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn remaining_ms(last: Option<u64>, min_interval_ms: u64, now_ms: u64) -> u64 {
        match last {
            None => 0,
            Some(last) => min_interval_ms.saturating_sub(now_ms.saturating_sub(last)),
        }
    }

    async fn slot(&self, domain: &str) -> Arc<Mutex<Option<u64>>> {
        self.domains
            .lock()
            .await
            .entry(domain.to_string())
            .or_default()
            .clone()
    }

    /// Milliseconds to wait before the next request to this domain at time
    /// `now_ms`. Zero when the domain has no recorded request or the
    /// interval has fully elapsed.
    pub async fn get_wait_ms(&self, domain: &str, now_ms: u64) -> u64 {
        let slot = { self.domains.lock().await.get(domain).cloned() };
        match slot {
            Some(slot) => Self::remaining_ms(*slot.lock().await, self.min_interval_ms, now_ms),
            None => 0,
        }
    }

    /// Record that a request was dispatched to `domain` at `now_ms`.
    pub async fn record_request(&self, domain: &str, now_ms: u64) {
        let slot = self.slot(domain).await;
        *slot.lock().await = Some(now_ms);
    }

    /// Wait out the remaining interval if needed, then record the dispatch.
    /// The domain lock is held for the whole sequence so the interval is
    /// measured between dispatches, not completions.
    pub async fn throttle(&self, url: &str) -> Throttled {
        let domain = extract_domain(url);
        let slot = self.slot(&domain).await;
        let mut last = slot.lock().await;

        let waited_ms = Self::remaining_ms(*last, self.min_interval_ms, Self::now_ms());
        if waited_ms > 0 {
            tokio::time::sleep(Duration::from_millis(waited_ms)).await;
        }
        *last = Some(Self::now_ms());

        Throttled { domain, waited_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn collapses_ats_subdomains_to_roots() {
        assert_eq!(
            extract_domain("https://boards.greenhouse.io/acme/jobs/1"),
            "greenhouse.io"
        );
        assert_eq!(extract_domain("https://jobs.lever.co/acme/abc"), "lever.co");
        assert_eq!(
            extract_domain("https://acme.myworkdayjobs.com/en-US/careers/1"),
            "myworkdayjobs.com"
        );
        assert_eq!(
            extract_domain("https://app.smartrecruiters.com/job/1"),
            "smartrecruiters.com"
        );
        assert_eq!(extract_domain("https://app.ashbyhq.com/posting/1"), "ashbyhq.com");
        assert_eq!(extract_domain("https://careers.icims.com/jobs/1"), "icims.com");
        assert_eq!(extract_domain("https://hire.jobvite.com/j/abc"), "jobvite.com");
        assert_eq!(extract_domain("https://acme.breezy.hr/p/abc"), "breezy.hr");
    }

    #[test]
    fn bare_root_maps_to_itself() {
        assert_eq!(extract_domain("https://greenhouse.io/path"), "greenhouse.io");
    }

    #[test]
    fn non_ats_hostnames_pass_through_lowercased() {
        assert_eq!(
            extract_domain("https://Careers.GOOGLE.com/jobs/1"),
            "careers.google.com"
        );
        assert_eq!(
            extract_domain("https://apply.workable.com/x"),
            "apply.workable.com"
        );
    }

    #[test]
    fn ports_are_stripped() {
        assert_eq!(extract_domain("https://greenhouse.io:443/path"), "greenhouse.io");
    }

    #[test]
    fn invalid_urls_map_to_unknown() {
        assert_eq!(extract_domain("not a url"), "unknown");
        assert_eq!(extract_domain(""), "unknown");
    }

    #[tokio::test]
    async fn wait_is_zero_without_prior_request() {
        let throttle = DomainThrottle::new(5_000);
        assert_eq!(throttle.get_wait_ms("greenhouse.io", 1_000).await, 0);
    }

    #[tokio::test]
    async fn wait_is_remaining_interval_after_a_request() {
        let throttle = DomainThrottle::new(5_000);
        throttle.record_request("greenhouse.io", 1_000).await;
        assert_eq!(throttle.get_wait_ms("greenhouse.io", 3_000).await, 3_000);
    }

    #[tokio::test]
    async fn wait_is_zero_once_interval_elapsed() {
        let throttle = DomainThrottle::new(5_000);
        throttle.record_request("greenhouse.io", 1_000).await;
        assert_eq!(throttle.get_wait_ms("greenhouse.io", 7_000).await, 0);
    }

    #[tokio::test]
    async fn wait_is_zero_exactly_at_the_boundary() {
        let throttle = DomainThrottle::new(5_000);
        throttle.record_request("a.com", 1_000).await;
        assert_eq!(throttle.get_wait_ms("a.com", 6_000).await, 0);
    }

    #[tokio::test]
    async fn domains_are_tracked_independently() {
        let throttle = DomainThrottle::new(5_000);
        throttle.record_request("greenhouse.io", 1_000).await;
        assert_eq!(throttle.get_wait_ms("lever.co", 1_000).await, 0);
    }

    #[tokio::test]
    async fn record_overwrites_previous_timestamp() {
        let throttle = DomainThrottle::new(5_000);
        throttle.record_request("a.com", 1_000).await;
        throttle.record_request("a.com", 4_000).await;
        assert_eq!(throttle.get_wait_ms("a.com", 5_000).await, 4_000);
    }

    #[tokio::test]
    async fn first_throttle_call_does_not_wait() {
        let throttle = DomainThrottle::new(5_000);
        let result = throttle.throttle("https://boards.greenhouse.io/x").await;
        assert_eq!(result.domain, "greenhouse.io");
        assert_eq!(result.waited_ms, 0);
    }

    #[tokio::test]
    async fn same_domain_calls_are_spaced_by_the_interval() {
        let throttle = DomainThrottle::new(100);
        let start = Instant::now();
        throttle.throttle("https://boards.greenhouse.io/a").await;
        let second = throttle.throttle("https://boards.greenhouse.io/b").await;
        assert!(second.waited_ms > 0);
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn different_domains_do_not_block_each_other() {
        let throttle = DomainThrottle::new(500);
        let start = Instant::now();
        throttle.throttle("https://boards.greenhouse.io/a").await;
        let second = throttle.throttle("https://jobs.lever.co/b").await;
        assert_eq!(second.waited_ms, 0);
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn concurrent_same_domain_calls_serialize() {
        let throttle = Arc::new(DomainThrottle::new(100));
        let start = Instant::now();

        let a = tokio::spawn({
            let throttle = throttle.clone();
            async move { throttle.throttle("https://boards.greenhouse.io/a").await }
        });
        let b = tokio::spawn({
            let throttle = throttle.clone();
            async move { throttle.throttle("https://boards.greenhouse.io/b").await }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        // One of the two must have waited out the interval.
        assert!(a.waited_ms > 0 || b.waited_ms > 0);
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
