// Exercises the lazy refresh path of a non-static provider against a counting
// token source and a manual clock:
//  - fast path: no fetch while the cached token is before replace_at
//  - single flight: 50 callers racing past replace_at cause one fetch
//  - failed refresh keeps the cache, next call tries again

#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::Duration;
    use tokio::sync::Barrier;

    use crate::error::ProviderError;
    use crate::helpers::time::{Clock, ManualClock};
    use crate::provider::{ProviderOptions, TokenProvider};
    use crate::sources::FetchToken;
    use crate::tests::common::{manual_clock, CountingSource};

    const CALLERS: usize = 50;

    async fn refreshing_provider(
        clock: &Arc<ManualClock>,
        source: &Arc<CountingSource>,
    ) -> Arc<TokenProvider> {
        let options = ProviderOptions::default()
            .with_clock(clock.clone())
            .with_refresh_buffer(Duration::seconds(20));
        let source: Arc<dyn FetchToken> = source.clone();
        Arc::new(TokenProvider::new_refreshing(source, options).await.unwrap())
    }

    async fn race_get_token(provider: &Arc<TokenProvider>, callers: usize) -> Vec<String> {
        let barrier = Arc::new(Barrier::new(callers));
        let mut handles = Vec::with_capacity(callers);
        for _ in 0..callers {
            let provider = provider.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                provider.get_token().await
            }));
        }

        let mut tokens = Vec::with_capacity(callers);
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap().token);
        }
        tokens
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_fetch_per_expiry_window_under_concurrency() {
        let clock = manual_clock();
        let start = clock.now();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(60)), StdDuration::from_millis(50));
        let provider = refreshing_provider(&clock, &source).await;

        // construction fetched the first token
        assert_eq!(source.calls(), 1);
        let record = provider.snapshot();
        assert_eq!(record.expires_at, Some(start + Duration::seconds(60)));
        assert_eq!(record.replace_at, Some(start + Duration::seconds(40)));

        // +39s: still before replace_at, served from cache
        clock.advance(Duration::seconds(39));
        let tokens = race_get_token(&provider, CALLERS).await;
        assert!(tokens.iter().all(|t| t == "token-1"));
        assert_eq!(source.calls(), 1, "no fetch while the cached token is valid");

        // +41s: every caller races past replace_at, exactly one fetch happens
        clock.advance(Duration::seconds(2));
        let tokens = race_get_token(&provider, CALLERS).await;
        assert!(tokens.iter().all(|t| t == "token-2"), "all callers get the refreshed token");
        assert_eq!(source.calls(), 2, "single flight refresh");

        let record = provider.snapshot();
        let expires_at = record.expires_at.unwrap();
        assert_eq!(expires_at, start + Duration::seconds(41 + 60));
        assert_eq!(record.replace_at, Some(expires_at - Duration::seconds(20)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failed_refresh_keeps_cached_token() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(60)), StdDuration::ZERO);
        let provider = refreshing_provider(&clock, &source).await;
        let before = provider.snapshot();

        clock.advance(Duration::seconds(45));
        source.set_failing(true);

        let err = provider.get_token().await.unwrap_err();
        assert!(matches!(err, ProviderError::Fetch(_)));
        assert_eq!(provider.snapshot(), before, "cache untouched by a failed refresh");
        assert_eq!(source.calls(), 2);

        // replace_at did not move, so the next call attempts again
        assert!(provider.get_token().await.is_err());
        assert_eq!(source.calls(), 3);

        source.set_failing(false);
        let token = provider.get_token().await.unwrap();
        assert_eq!(token.token, "token-4");
        assert_eq!(source.calls(), 4);
        assert_ne!(provider.snapshot(), before);
    }

    #[tokio::test]
    async fn expiry_in_the_past_refreshes_on_every_call() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(-10)), StdDuration::ZERO);
        let provider = refreshing_provider(&clock, &source).await;
        assert_eq!(source.calls(), 1);

        for expected_calls in 2..=4 {
            let token = provider.get_token().await.unwrap();
            assert_eq!(token.token, format!("token-{}", expected_calls));
            assert_eq!(source.calls(), expected_calls);
        }
    }

    #[tokio::test]
    async fn unknown_expiry_refreshes_on_every_call() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), None, StdDuration::ZERO);
        let provider = refreshing_provider(&clock, &source).await;
        assert!(provider.snapshot().replace_at.unwrap() < clock.now());

        provider.get_token().await.unwrap();
        provider.get_token().await.unwrap();
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn slow_first_fetch_times_out() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(60)), StdDuration::from_millis(500));
        let options = ProviderOptions::default()
            .with_clock(clock.clone())
            .with_fetch_timeout(StdDuration::from_millis(50));
        let source: Arc<dyn FetchToken> = source;

        let err = TokenProvider::new_refreshing(source, options).await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(StdDuration::from_millis(50)));
    }

    #[tokio::test]
    async fn slow_refresh_times_out_and_keeps_cache() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(60)), StdDuration::ZERO);
        let options = ProviderOptions::default()
            .with_clock(clock.clone())
            .with_fetch_timeout(StdDuration::from_millis(100));
        let dyn_source: Arc<dyn FetchToken> = source.clone();
        let provider = TokenProvider::new_refreshing(dyn_source, options).await.unwrap();
        let before = provider.snapshot();

        clock.advance(Duration::seconds(50));
        source.set_delay(StdDuration::from_millis(500));
        let err = provider.get_token().await.unwrap_err();
        assert_eq!(err, ProviderError::Timeout(StdDuration::from_millis(100)));
        assert_eq!(provider.snapshot(), before);

        source.set_delay(StdDuration::ZERO);
        assert_eq!(provider.get_token().await.unwrap().token, "token-3");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cached_record_readable_while_refresh_in_flight() {
        let clock = manual_clock();
        let source = CountingSource::new(clock.clone(), Some(Duration::seconds(60)), StdDuration::ZERO);
        let provider = refreshing_provider(&clock, &source).await;

        source.set_delay(StdDuration::from_millis(300));
        clock.advance(Duration::seconds(41));
        let refreshing = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.get_token().await })
        };

        // refresh is now parked inside the source with the guard held
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        assert_eq!(source.calls(), 2);
        let stale = tokio::time::timeout(StdDuration::from_millis(20), async { provider.snapshot() })
            .await
            .unwrap();
        assert_eq!(stale.value, "token-1");

        assert_eq!(refreshing.await.unwrap().unwrap().token, "token-2");
        assert_eq!(provider.snapshot().value, "token-2");
    }
}
