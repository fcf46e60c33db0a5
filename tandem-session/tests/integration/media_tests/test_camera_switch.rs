use tandem_session::CameraFacing;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{EngineCall, ListenerEvent, SIGNAL_TIMEOUT_MS};

#[tokio::test]
async fn test_camera_switch_recreates_and_reattaches_stream() {
    init_tracing();

    let mut session = create_test_session();
    let generation = session.start_as_offerer().await;

    session.handle.switch_camera().await.unwrap();

    let expected = EngineCall::AddLocalStream {
        generation,
        stream_id: "mock-2".to_owned(),
    };
    let reattached = session
        .engine
        .wait_for_call(|c| *c == expected, SIGNAL_TIMEOUT_MS)
        .await;
    assert!(reattached, "new stream was not attached");

    let calls = session.engine.calls().await;
    let released_at = calls
        .iter()
        .position(|c| {
            *c == EngineCall::ReleaseLocalStream {
                stream_id: "mock-1".to_owned(),
            }
        })
        .expect("old stream was not released");
    let opened_at = calls
        .iter()
        .position(|c| {
            *c == EngineCall::OpenLocalStream {
                facing: CameraFacing::Back,
            }
        })
        .expect("back camera was not opened");
    assert!(released_at < opened_at, "device must be released before reopening");

    assert_eq!(
        session
            .listener
            .get_events()
            .await
            .into_iter()
            .filter(|e| matches!(e, ListenerEvent::LocalStream { .. }))
            .collect::<Vec<_>>(),
        vec![
            ListenerEvent::LocalStream {
                stream_id: "mock-1".to_owned(),
                facing: CameraFacing::Front,
            },
            ListenerEvent::LocalStream {
                stream_id: "mock-2".to_owned(),
                facing: CameraFacing::Back,
            },
        ]
    );
}

#[tokio::test]
async fn test_camera_switch_without_peer_only_swaps_stream() {
    init_tracing();

    let session = create_test_session();

    session.handle.switch_camera().await.unwrap();
    session.handle.switch_camera().await.unwrap();

    let released = session
        .engine
        .wait_for_call(
            |c| {
                *c == EngineCall::ReleaseLocalStream {
                    stream_id: "mock-2".to_owned(),
                }
            },
            SIGNAL_TIMEOUT_MS,
        )
        .await;
    assert!(released, "second switch did not release the back camera");
    let reopened = session
        .listener
        .wait_for(
            |e| {
                *e == ListenerEvent::LocalStream {
                    stream_id: "mock-3".to_owned(),
                    facing: CameraFacing::Front,
                }
            },
            SIGNAL_TIMEOUT_MS,
        )
        .await;
    assert!(reopened, "front camera was not reopened");

    let facings: Vec<CameraFacing> = session
        .engine
        .calls()
        .await
        .into_iter()
        .filter_map(|c| match c {
            EngineCall::OpenLocalStream { facing } => Some(facing),
            _ => None,
        })
        .collect();
    assert_eq!(
        facings,
        vec![CameraFacing::Front, CameraFacing::Back, CameraFacing::Front]
    );
    assert_eq!(
        session
            .engine
            .count_calls(|c| matches!(c, EngineCall::AddLocalStream { .. }))
            .await,
        0
    );
}
