// Request Coalescing Integration Tests
//
// Concurrent requests for one uncached path share a single origin fetch

#[cfg(test)]
mod tests {
    use super::super::test_harness::{pipeline_with, CountingOrigin, Route};
    use shrinkray::pipeline::RequestContext;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_fetch_once() {
        let origin = CountingOrigin::new();
        origin.route(
            "/slow.css",
            Route::ok("text/css", "body {\n  color : red ;\n}\n").delayed(Duration::from_millis(100)),
        );
        let pipeline = pipeline_with(origin.clone());

        let mut handles = vec![];
        for _ in 0..16 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline
                    .handle(&RequestContext::new("GET", "/slow.css"))
                    .await
            }));
        }

        let mut responses = vec![];
        for handle in handles {
            responses.push(handle.await.unwrap());
        }

        assert_eq!(origin.fetch_count("/slow.css"), 1);
        let first = &responses[0];
        for response in &responses {
            assert_eq!(response.status, 200);
            assert_eq!(response.body, first.body);
            assert_eq!(response.content_type, "text/css");
        }
        assert!(responses.iter().any(|r| r.cache_status == "coalesced"));
        assert_eq!(pipeline.cache().in_flight_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_coalesced_requests_share_failure_then_retry() {
        let origin = CountingOrigin::new();
        origin.route(
            "/flaky",
            Route::unreachable().delayed(Duration::from_millis(100)),
        );
        let pipeline = pipeline_with(origin.clone());

        let mut handles = vec![];
        for _ in 0..8 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline.handle(&RequestContext::new("GET", "/flaky")).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().status, 404);
        }
        assert_eq!(origin.fetch_count("/flaky"), 1);

        // Origin recovers; the failure was not cached
        origin.route("/flaky", Route::ok("text/plain", "back"));
        let response = pipeline.handle(&RequestContext::new("GET", "/flaky")).await;
        assert_eq!(response.status, 200);
        assert_eq!(origin.fetch_count("/flaky"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_coalesced_followers_receive_origin_status() {
        let origin = CountingOrigin::new();
        origin.route(
            "/redirect",
            Route::ok("text/html", "<p>moved</p>")
                .status(302)
                .delayed(Duration::from_millis(100)),
        );
        let pipeline = pipeline_with(origin.clone());

        let mut handles = vec![];
        for _ in 0..4 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline
                    .handle(&RequestContext::new("GET", "/redirect"))
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().status, 302);
        }
        assert_eq!(origin.fetch_count("/redirect"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_paths_are_not_serialized() {
        let origin = CountingOrigin::new();
        for i in 0..8 {
            origin.route(
                &format!("/item/{}", i),
                Route::ok("text/plain", format!("item {}", i)).delayed(Duration::from_millis(200)),
            );
        }
        let pipeline = pipeline_with(origin.clone());

        let start = std::time::Instant::now();
        let mut handles = vec![];
        for i in 0..8 {
            let pipeline = pipeline.clone();
            handles.push(tokio::spawn(async move {
                pipeline
                    .handle(&RequestContext::new("GET", format!("/item/{}", i)))
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().status, 200);
        }

        assert_eq!(origin.total_fetches(), 8);
        assert!(start.elapsed() < Duration::from_millis(1500));
    }
}
