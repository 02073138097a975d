//! # Classifier-Gated Retry Flows
//!
//! The retrier and the fault classifier working as the submission path
//! does: classify the failure, retry only when the category allows it.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use mirror_faults::{classify, ClassifyOptions, Retrier, RetryConfig};
    use mirror_types::{FaultCategory, FaultCode};

    /// The submission op fails twice with a transient error, then succeeds:
    /// three invocations total, success value returned.
    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let retrier = Retrier::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<&str, String> = retrier
            .run("submit:geometry.move", &RetryConfig::default(), move || {
                let calls = calls_clone.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("connection reset by peer".to_string())
                    } else {
                        Ok("confirmed")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("confirmed"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// Retry eligibility comes from the classifier: connectivity failures
    /// retry, validation failures do not.
    #[tokio::test(start_paused = true)]
    async fn test_retry_gated_by_classification() {
        let retrier = Retrier::new();
        let config = RetryConfig::for_testing();

        for (message, expect_retry) in [
            ("network unreachable", true),
            ("HTTP 500 internal server error", true),
            ("invalid node reference", false),
            ("403 forbidden", false),
        ] {
            let fault = classify(message, ClassifyOptions::default());
            assert_eq!(fault.retryable, expect_retry, "message: {message}");

            let calls = Arc::new(AtomicU32::new(0));
            let calls_clone = calls.clone();
            let op = move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async move { Err::<(), &str>("still failing") }
            };

            if fault.retryable {
                let _ = retrier.run(message, &config, op).await;
                assert_eq!(calls.load(Ordering::SeqCst), config.max_retries);
            }
            // Non-retryable faults never reach the retrier; the fault is
            // surfaced to the user instead.
        }
    }

    /// A websocket drop is connectivity, not a generic network fault, and
    /// the user copy signals the reconnect.
    #[tokio::test]
    async fn test_websocket_fault_classification() {
        let fault = classify(
            "websocket connection closed: code 1006",
            ClassifyOptions::default(),
        );
        assert_eq!(fault.notice.code, FaultCode::WebSocket);
        assert_eq!(fault.category, FaultCategory::Connectivity);
        assert!(fault.retryable);
        assert!(fault.notice.user_message.contains("Reconnecting"));
    }
}
