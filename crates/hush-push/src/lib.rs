// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push-relay registration for the Hush messenger client.

pub mod registrar;

pub use registrar::{ClosedGroupOperation, PushRegistrar};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use hush_core::{PushRegistrationState, PushStateStore, ServerTarget};
    use hush_test_utils::{MemoryDirectory, MemoryPushStateStore, Scripted, ScriptedDispatcher};

    use crate::registrar::{ClosedGroupOperation, PushRegistrar};

    const TOKEN_EXPIRY_MS: i64 = 12 * 60 * 60 * 1000;

    fn registrar(
        dispatcher: Arc<ScriptedDispatcher>,
        state: Arc<MemoryPushStateStore>,
        directory: MemoryDirectory,
    ) -> PushRegistrar {
        PushRegistrar::new(
            dispatcher,
            state,
            Arc::new(directory),
            ServerTarget::new("https://push.example", "aa"),
            TOKEN_EXPIRY_MS,
        )
    }

    #[tokio::test]
    async fn register_uploads_token_and_resubscribes_groups() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        let directory = MemoryDirectory::new(vec!["group-a".into(), "group-b".into()], None);
        let registrar = registrar(dispatcher.clone(), state.clone(), directory);

        registrar.register("fcm-token", "05user", false).await.unwrap();

        let requests = dispatcher.requests().await;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].endpoint, "/register");
        assert_eq!(requests[0].body["token"], "fcm-token");
        assert_eq!(requests[0].body["pubKey"], "05user");
        assert_eq!(requests[1].endpoint, "/subscribe_closed_group");
        assert_eq!(requests[1].body["closedGroupPublicKey"], "group-a");
        assert_eq!(requests[2].body["closedGroupPublicKey"], "group-b");

        let stored = state.registration_state().await.unwrap();
        assert_eq!(stored.token.as_deref(), Some("fcm-token"));
        assert!(stored.enabled);
        assert!(stored.last_upload_ms.is_some());
    }

    #[tokio::test]
    async fn register_twice_within_freshness_window_uploads_once() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        let registrar = registrar(dispatcher.clone(), state.clone(), MemoryDirectory::empty());

        registrar.register("fcm-token", "05user", false).await.unwrap();
        registrar.register("fcm-token", "05user", false).await.unwrap();

        assert_eq!(dispatcher.call_count().await, 1);
    }

    #[tokio::test]
    async fn changed_token_uploads_even_within_window() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        let registrar = registrar(dispatcher.clone(), state.clone(), MemoryDirectory::empty());

        registrar.register("fcm-token", "05user", false).await.unwrap();
        registrar.register("other-token", "05user", false).await.unwrap();

        assert_eq!(dispatcher.call_count().await, 2);
        let stored = state.registration_state().await.unwrap();
        assert_eq!(stored.token.as_deref(), Some("other-token"));
    }

    #[tokio::test]
    async fn force_register_bypasses_the_dedup_check() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        let registrar = registrar(dispatcher.clone(), state.clone(), MemoryDirectory::empty());

        registrar.register("fcm-token", "05user", false).await.unwrap();
        registrar.register("fcm-token", "05user", true).await.unwrap();

        assert_eq!(dispatcher.call_count().await, 2);
    }

    #[tokio::test]
    async fn stale_upload_timestamp_triggers_a_fresh_upload() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        state
            .set_state(PushRegistrationState {
                token: Some("fcm-token".into()),
                last_upload_ms: Some(1), // far beyond the 12 h window
                enabled: true,
            })
            .await;
        let registrar = registrar(dispatcher.clone(), state.clone(), MemoryDirectory::empty());

        registrar.register("fcm-token", "05user", false).await.unwrap();

        assert_eq!(dispatcher.call_count().await, 1);
    }

    #[tokio::test]
    async fn rejected_registration_leaves_state_untouched() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        dispatcher
            .push(Scripted::Rejection {
                code: 4,
                message: "bad token".into(),
            })
            .await;
        let state = Arc::new(MemoryPushStateStore::new());
        let directory = MemoryDirectory::new(vec!["group-a".into()], None);
        let registrar = registrar(dispatcher.clone(), state.clone(), directory);

        registrar.register("fcm-token", "05user", false).await.unwrap();

        // No group fan-out after a rejected upload, and no state change.
        assert_eq!(dispatcher.call_count().await, 1);
        let stored = state.registration_state().await.unwrap();
        assert_eq!(stored, PushRegistrationState::default());
    }

    #[tokio::test]
    async fn unregister_unsubscribes_groups_then_disables_push() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        state
            .set_state(PushRegistrationState {
                token: Some("fcm-token".into()),
                last_upload_ms: Some(1),
                enabled: true,
            })
            .await;
        let directory =
            MemoryDirectory::new(vec!["group-a".into(), "group-b".into()], Some("05user".into()));
        let registrar = registrar(dispatcher.clone(), state.clone(), directory);

        registrar.unregister("fcm-token").await.unwrap();

        let requests = dispatcher.requests().await;
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].endpoint, "/unregister");
        assert_eq!(requests[1].endpoint, "/unsubscribe_closed_group");
        assert_eq!(requests[2].endpoint, "/unsubscribe_closed_group");
        assert!(!state.registration_state().await.unwrap().enabled);
    }

    #[tokio::test]
    async fn operations_are_skipped_entirely_when_push_is_disabled() {
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let state = Arc::new(MemoryPushStateStore::new());
        state
            .set_state(PushRegistrationState {
                token: Some("fcm-token".into()),
                last_upload_ms: Some(1),
                enabled: true,
            })
            .await;
        let registrar = registrar(
            dispatcher.clone(),
            state.clone(),
            MemoryDirectory::new(Vec::new(), Some("05user".into())),
        );

        registrar.unregister("fcm-token").await.unwrap();
        assert_eq!(dispatcher.call_count().await, 1);

        // Push is now disabled: a subscribe attempt makes no network call.
        registrar
            .perform_operation(ClosedGroupOperation::Subscribe, "group-a", "05user")
            .await
            .unwrap();
        assert_eq!(dispatcher.call_count().await, 1);
    }

    #[tokio::test]
    async fn register_flows_through_the_real_dispatch_client() {
        use hush_onion::{OnionClient, RELAY_PATH};
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(RELAY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OnionClient::new(Duration::from_secs(5), 4).unwrap();
        let state = Arc::new(MemoryPushStateStore::new());
        let registrar = PushRegistrar::new(
            Arc::new(client),
            state.clone(),
            Arc::new(MemoryDirectory::empty()),
            ServerTarget::new(server.uri(), "aa"),
            TOKEN_EXPIRY_MS,
        );

        registrar.register("fcm-token", "05user", false).await.unwrap();
        assert!(state.registration_state().await.unwrap().enabled);
    }
}
