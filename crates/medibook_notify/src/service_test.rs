#[cfg(test)]
mod tests {
    use crate::service::{NotifyError, TracingDispatcher, WebhookDispatcher};
    use medibook_common::services::{BookingNotification, NotificationDispatcher};
    use medibook_config::NotificationConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> BookingNotification {
        BookingNotification {
            booking_id: 42,
            patient_name: "Ann".to_string(),
            time: Some("08:00 - 09:00".to_string()),
            provider_name: Some("Dr. Lee".to_string()),
            language: Some("en".to_string()),
            redirect_link: "http://localhost:3000/verify-booking?token=t&doctorId=7".to_string(),
            restored: false,
        }
    }

    fn config(url: Option<String>) -> NotificationConfig {
        NotificationConfig {
            webhook_url: url,
            sender: Some("bookings@clinic.test".to_string()),
            api_key: Some("relay-key".to_string()),
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn test_tracing_dispatcher_always_succeeds() {
        let result = TracingDispatcher.send("ann@example.com", notification()).await;
        let result = result.expect("logging never fails");
        assert_eq!(result.id, "log-42");
    }

    #[test]
    fn test_webhook_requires_url() {
        let err = WebhookDispatcher::from_config(&config(None)).unwrap_err();
        assert!(matches!(err, NotifyError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_webhook_posts_notification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer relay-key"))
            .and(body_partial_json(serde_json::json!({
                "to": "ann@example.com",
                "from": "bookings@clinic.test",
                "booking_id": 42,
                "redirect_link": "http://localhost:3000/verify-booking?token=t&doctorId=7"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher =
            WebhookDispatcher::from_config(&config(Some(format!("{}/send", server.uri())))).unwrap();
        let result = dispatcher
            .send("ann@example.com", notification())
            .await
            .unwrap();

        assert_eq!(result.id, "msg-1");
        assert_eq!(result.status, "200");
    }

    #[tokio::test]
    async fn test_webhook_surfaces_relay_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("relay down"))
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::from_config(&config(Some(server.uri()))).unwrap();
        let err = dispatcher
            .send("ann@example.com", notification())
            .await
            .unwrap_err();

        match err {
            NotifyError::ApiError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "relay down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
