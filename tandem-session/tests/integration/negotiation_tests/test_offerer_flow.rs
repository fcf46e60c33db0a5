use serde_json::json;
use tandem_core::{RoomId, SessionDescription, SignalMessage};
use tandem_session::{ConnectionStatus, EngineConnectionState, EngineEvent};

use crate::integration::{ROOM, create_test_session, init_tracing};
use crate::utils::{EngineCall, ListenerEvent, SIGNAL_TIMEOUT_MS, answer, wait_for_signal};

#[tokio::test]
async fn test_offerer_end_to_end() {
    init_tracing();

    let mut session = create_test_session();
    let generation = session.start_as_offerer().await;

    // Exactly one offerer peer and one createOffer
    assert_eq!(
        session
            .engine
            .count_calls(|c| matches!(c, EngineCall::CreatePeer { .. }))
            .await,
        1
    );
    assert_eq!(
        session
            .engine
            .count_calls(|c| matches!(c, EngineCall::CreateOffer { .. }))
            .await,
        1
    );

    // Engine hands back the offer
    session
        .engine
        .emit(
            generation,
            EngineEvent::DescriptionReady(SessionDescription::offer("SDP_A")),
        )
        .await;

    let sent = wait_for_signal(&mut session.outbound, "offer", SIGNAL_TIMEOUT_MS)
        .await
        .expect("offer not sent");
    assert_eq!(
        serde_json::to_value(&sent).unwrap(),
        json!({
            "event": "offer",
            "data": {"roomId": "R1", "offer": {"type": "offer", "sdp": "SDP_A"}}
        })
    );
    assert!(session.engine.calls().await.contains(&EngineCall::SetLocalDescription {
        generation,
        desc: SessionDescription::offer("SDP_A"),
    }));

    // Remote answer is applied to the offerer
    session.deliver(answer(ROOM, "SDP_B")).await;
    let applied = session
        .engine
        .wait_for_call(
            |c| {
                *c == EngineCall::SetRemoteDescription {
                    generation,
                    desc: SessionDescription::answer("SDP_B"),
                }
            },
            SIGNAL_TIMEOUT_MS,
        )
        .await;
    assert!(applied, "answer was not applied");

    // Connectivity established
    session
        .engine
        .emit(
            generation,
            EngineEvent::ConnectionStateChanged(EngineConnectionState::Connected),
        )
        .await;
    let connected = session
        .listener
        .wait_for(
            |e| *e == ListenerEvent::Status(ConnectionStatus::Connected),
            SIGNAL_TIMEOUT_MS,
        )
        .await;
    assert!(connected, "CONNECTED was not reported");
    assert_eq!(
        session.listener.statuses().await,
        vec![ConnectionStatus::Connecting, ConnectionStatus::Connected]
    );

    // Only one join was ever sent
    assert_eq!(
        session.signaling.sent_named("join room").await,
        vec![SignalMessage::JoinRoom {
            room_id: RoomId::new(ROOM)
        }]
    );
}
