// src/render/tests.rs

use super::backend::{RenderType, Viewport, RENDER_MODULE_TAG};
use super::frame::FrameBuffer;
use super::mock::{MockRenderFactory, RenderCall};
use super::session::RenderSession;
use crate::display::NativeWindowHandle;
use crate::error::RendererError;
use crate::stream_id::StreamIdIssuer;
use test_log::test;

fn window() -> NativeWindowHandle {
    NativeWindowHandle::from_raw(0x0040_0001)
}

fn frame() -> FrameBuffer {
    FrameBuffer::solid_bgra(4, 2, [0, 0, 0xff, 0xff]).unwrap()
}

#[test]
fn it_should_create_attach_and_start_in_order() {
    let factory = MockRenderFactory::new();
    let id = StreamIdIssuer::new().issue();
    let session = RenderSession::new(id);

    session.start(&factory, window(), false).unwrap();
    assert!(session.is_active());
    assert_eq!(
        factory.calls(),
        vec![
            RenderCall::Create {
                tag: RENDER_MODULE_TAG,
                window: window(),
                fullscreen: false,
                render_type: RenderType::X11,
            },
            RenderCall::AddStream {
                id,
                z_order: 0,
                viewport: Viewport::FULL,
            },
            RenderCall::StartRender(id),
        ]
    );
}

#[test]
fn it_should_use_the_fixed_module_tag_regardless_of_stream_id() {
    let factory = MockRenderFactory::new();
    let issuer = StreamIdIssuer::starting_at(40);
    let first = RenderSession::new(issuer.issue());
    let second = RenderSession::new(issuer.issue());
    first.start(&factory, window(), false).unwrap();
    second.start(&factory, window(), true).unwrap();

    let tags: Vec<_> = factory
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RenderCall::Create { tag, .. } => Some(tag),
            _ => None,
        })
        .collect();
    assert_eq!(tags, vec![1337, 1337]);
}

#[test]
fn it_should_forward_each_frame_exactly_once_while_active() {
    let factory = MockRenderFactory::new();
    let id = StreamIdIssuer::new().issue();
    let session = RenderSession::new(id);
    session.start(&factory, window(), false).unwrap();

    session.submit_frame(&frame());
    assert_eq!(factory.frames_rendered(id), 1);
    assert!(factory.calls().contains(&RenderCall::RenderFrame {
        id,
        width: 4,
        height: 2
    }));

    session.submit_frame(&frame());
    assert_eq!(factory.frames_rendered(id), 2);
}

#[test]
fn it_should_drop_frames_before_start_and_after_stop() {
    let factory = MockRenderFactory::new();
    let id = StreamIdIssuer::new().issue();
    let session = RenderSession::new(id);

    session.submit_frame(&frame());
    assert_eq!(factory.frames_rendered(id), 0);

    session.start(&factory, window(), false).unwrap();
    session.stop();
    session.submit_frame(&frame());
    assert_eq!(factory.frames_rendered(id), 0);
}

#[test]
fn it_should_tear_down_in_reverse_order_and_only_once() {
    let factory = MockRenderFactory::new();
    let id = StreamIdIssuer::new().issue();
    let session = RenderSession::new(id);
    session.start(&factory, window(), false).unwrap();

    session.stop();
    let after_first = factory.calls();
    assert_eq!(
        &after_first[after_first.len() - 3..],
        &[
            RenderCall::StopRender(id),
            RenderCall::DeleteStream(id),
            RenderCall::Destroy,
        ]
    );
    assert!(!session.is_active());
    assert!(!session.has_backend());
    assert_eq!(factory.live_backends(), 0);

    session.stop();
    assert_eq!(factory.calls(), after_first);
}

#[test]
fn it_should_report_backend_creation_failure_without_attaching() {
    let factory = MockRenderFactory::new().failing_create();
    let session = RenderSession::new(StreamIdIssuer::new().issue());

    assert_eq!(
        session.start(&factory, window(), false),
        Err(RendererError::BackendCreationFailed)
    );
    assert_eq!(factory.calls().len(), 1);
    assert!(!session.has_backend());
}

#[test]
fn it_should_release_the_backend_when_attach_fails() {
    let factory = MockRenderFactory::new().failing_attach();
    let session = RenderSession::new(StreamIdIssuer::new().issue());

    assert_eq!(
        session.start(&factory, window(), false),
        Err(RendererError::StreamAttachFailed)
    );
    assert!(session.has_backend());
    assert!(!session.is_active());
    assert!(!factory
        .calls()
        .iter()
        .any(|call| matches!(call, RenderCall::StartRender(_))));

    session.stop();
    assert_eq!(factory.live_backends(), 0);
    assert_eq!(factory.calls().last(), Some(&RenderCall::Destroy));
}

#[test]
fn it_should_keep_the_stream_attached_when_start_fails() {
    let factory = MockRenderFactory::new().failing_start();
    let id = StreamIdIssuer::new().issue();
    let session = RenderSession::new(id);

    assert_eq!(
        session.start(&factory, window(), false),
        Err(RendererError::RenderStartFailed)
    );
    assert!(session.is_active());

    drop(session);
    let calls = factory.calls();
    assert_eq!(
        &calls[calls.len() - 3..],
        &[
            RenderCall::StopRender(id),
            RenderCall::DeleteStream(id),
            RenderCall::Destroy,
        ]
    );
}
