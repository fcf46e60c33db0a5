use tandem_core::{RoomId, SessionDescription, SignalMessage};
use tandem_session::{ChannelEvent, SessionError};

use crate::integration::{ROOM, create_test_session, init_tracing};
use crate::utils::{EngineCall, ListenerEvent, SIGNAL_TIMEOUT_MS};

#[tokio::test]
async fn test_malformed_payload_is_reported() {
    init_tracing();

    let mut session = create_test_session();
    session.connect().await;

    session
        .deliver(ChannelEvent::Malformed {
            event: "offer".to_owned(),
            reason: "missing field `offer`".to_owned(),
        })
        .await;

    let expected = ListenerEvent::Error(SessionError::Malformed {
        event: "offer".to_owned(),
        reason: "missing field `offer`".to_owned(),
    });
    assert!(
        session
            .listener
            .wait_for(|e| *e == expected, SIGNAL_TIMEOUT_MS)
            .await
    );

    session.sync().await;
    assert_eq!(
        session
            .engine
            .count_calls(|c| matches!(c, EngineCall::CreatePeer { .. }))
            .await,
        0
    );
}

#[tokio::test]
async fn test_offer_carrying_answer_is_rejected() {
    init_tracing();

    let mut session = create_test_session();
    session.connect().await;

    session
        .deliver(ChannelEvent::Message(SignalMessage::Offer {
            room_id: RoomId::new(ROOM),
            offer: SessionDescription::answer("SDP_A"),
        }))
        .await;
    session.sync().await;

    let errors = session.listener.errors().await;
    assert!(matches!(
        &errors[..],
        [SessionError::Malformed { event, .. }] if event == "offer"
    ));
    assert_eq!(
        session
            .engine
            .count_calls(|c| matches!(c, EngineCall::CreatePeer { .. }))
            .await,
        0
    );
}
