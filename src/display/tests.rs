// src/display/tests.rs

use super::driver::{AttributeMask, EventMask};
use super::drivers::{DisplayCall, MapBehaviour, MockDisplayConnector};
use super::manager::{MapWait, SurfaceManager};
use crate::cancel::CancelToken;
use crate::config::SurfaceConfig;
use crate::error::RendererError;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use test_log::test;

fn wait(cancel: &CancelToken) -> MapWait<'_> {
    MapWait {
        cancel,
        timeout: None,
    }
}

#[test]
fn it_should_create_and_map_a_window_in_order() {
    let connector = MockDisplayConnector::new();
    let cancel = CancelToken::new();
    let config = SurfaceConfig::default();

    let surface = SurfaceManager::new(&connector)
        .create(&config, wait(&cancel))
        .expect("surface should be created");
    let window = surface.window();
    assert!(!window.is_none());

    assert_eq!(
        connector.calls(),
        vec![
            DisplayCall::Open,
            DisplayCall::MatchVisual { depth: 24 },
            DisplayCall::CreateColormap(1),
            DisplayCall::CreateWindow {
                width: 600,
                height: 480,
                depth: 24,
                mask: AttributeMask::BACK_PIXEL
                    | AttributeMask::BORDER_PIXEL
                    | AttributeMask::COLORMAP
                    | AttributeMask::EVENT_MASK,
                event_mask: EventMask::STRUCTURE_NOTIFY | EventMask::EXPOSURE,
            },
            DisplayCall::SetNames(config.title.clone()),
            DisplayCall::SelectInput(EventMask::STRUCTURE_NOTIFY),
            DisplayCall::Map(window),
        ]
    );
    assert_eq!(connector.live_windows(), vec![window]);
}

#[test]
fn it_should_release_window_and_connection_on_drop() {
    let connector = MockDisplayConnector::new();
    let cancel = CancelToken::new();

    let surface = SurfaceManager::new(&connector)
        .create(&SurfaceConfig::default(), wait(&cancel))
        .unwrap();
    let window = surface.window();
    assert_eq!(connector.open_connections(), 1);
    drop(surface);

    let calls = connector.calls();
    let tail = &calls[calls.len() - 3..];
    assert_eq!(
        tail,
        &[
            DisplayCall::DestroyWindow(window),
            DisplayCall::FreeColormap(1),
            DisplayCall::Close,
        ]
    );
    assert!(connector.live_windows().is_empty());
    assert_eq!(connector.open_connections(), 0);
}

#[test]
fn it_should_reject_out_of_range_geometry_before_opening_the_display() {
    let connector = MockDisplayConnector::new();
    let cancel = CancelToken::new();

    for (width, height) in [(0, 480), (600, 0), (600, 70_000)] {
        let config = SurfaceConfig {
            width,
            height,
            ..SurfaceConfig::default()
        };
        let result = SurfaceManager::new(&connector).create(&config, wait(&cancel));
        assert_eq!(result.err(), Some(RendererError::WindowCreationFailed));
    }
    assert!(connector.calls().is_empty());
    assert_eq!(connector.open_connections(), 0);
}

#[test]
fn it_should_report_display_unavailable_when_the_server_is_unreachable() {
    let connector = MockDisplayConnector::new().unreachable();
    let cancel = CancelToken::new();

    let result = SurfaceManager::new(&connector).create(&SurfaceConfig::default(), wait(&cancel));
    assert_eq!(result.err(), Some(RendererError::DisplayUnavailable));
    assert_eq!(connector.calls(), vec![DisplayCall::Open]);
}

#[test]
fn it_should_fail_window_creation_without_a_true_color_visual() {
    let connector = MockDisplayConnector::new().without_true_color();
    let cancel = CancelToken::new();

    let result = SurfaceManager::new(&connector).create(&SurfaceConfig::default(), wait(&cancel));
    assert_eq!(result.err(), Some(RendererError::WindowCreationFailed));
    assert!(!connector
        .calls()
        .iter()
        .any(|call| matches!(call, DisplayCall::CreateWindow { .. })));
    assert_eq!(connector.open_connections(), 0);
}

#[test]
fn it_should_free_the_colormap_when_the_window_is_refused() {
    let connector = MockDisplayConnector::new().refusing_windows();
    let cancel = CancelToken::new();

    let result = SurfaceManager::new(&connector).create(&SurfaceConfig::default(), wait(&cancel));
    assert_eq!(result.err(), Some(RendererError::WindowCreationFailed));

    let calls = connector.calls();
    assert!(calls.contains(&DisplayCall::FreeColormap(1)));
    assert!(!calls.iter().any(|call| matches!(call, DisplayCall::Map(_))));
    assert_eq!(calls.last(), Some(&DisplayCall::Close));
}

#[test]
fn it_should_ignore_events_for_other_windows_while_waiting() {
    let connector = MockDisplayConnector::new().with_map_behaviour(MapBehaviour::AfterNoise);
    let cancel = CancelToken::new();

    let surface = SurfaceManager::new(&connector)
        .create(&SurfaceConfig::default(), wait(&cancel))
        .expect("map notify for our window should end the wait");
    assert_eq!(connector.live_windows(), vec![surface.window()]);
}

#[test]
fn it_should_time_out_when_a_deadline_is_configured() {
    let connector = MockDisplayConnector::new().with_map_behaviour(MapBehaviour::Never);
    let cancel = CancelToken::new();
    let timeout = Duration::from_millis(150);

    let result = SurfaceManager::new(&connector).create(
        &SurfaceConfig::default(),
        MapWait {
            cancel: &cancel,
            timeout: Some(timeout),
        },
    );
    assert_eq!(result.err(), Some(RendererError::MapWaitTimedOut(timeout)));
    assert!(connector.live_windows().is_empty());
}

#[test]
fn it_should_block_until_cancelled_when_the_window_is_never_mapped() {
    let connector = MockDisplayConnector::new().with_map_behaviour(MapBehaviour::Never);
    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();

    let worker = {
        let connector = connector.clone();
        let cancel = cancel.clone();
        thread::spawn(move || {
            let result = SurfaceManager::new(&connector)
                .create(&SurfaceConfig::default(), wait(&cancel))
                .map(|_| ());
            let _ = tx.send(result);
        })
    };

    assert!(
        rx.recv_timeout(Duration::from_millis(400)).is_err(),
        "create() returned although the window was never mapped"
    );

    cancel.cancel();
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("cancellation should end the wait");
    assert_eq!(result, Err(RendererError::MapWaitCancelled));
    worker.join().unwrap();
    assert!(connector.live_windows().is_empty());
}
