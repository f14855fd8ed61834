//! Multi-peer scenarios over a loopback room.

use kurbo::Point;
use liveboard_core::config::HistoryConfig;
use liveboard_core::presence::{CursorPosition, PresenceTransport};
use liveboard_core::{
    CanvasEngine, CanvasEvent, CrdtDocument, CursorState, Key, KeyEvent, LoopbackConnection,
    LoopbackRoom, Modifiers, Scene, Session, SessionConfig, SharedDocument, ShapeId, ShapeKind,
    ToolKind,
};

type Peer = Session<Scene, CrdtDocument, LoopbackConnection>;

fn config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.history = HistoryConfig {
        max_undo_steps: 100,
        merge_interval_ms: 0,
    };
    config
}

fn join(room: &LoopbackRoom) -> Peer {
    let config = config();
    let document = CrdtDocument::with_history(&config.history);
    Session::new(Scene::default(), document, room.connect(), config, 0)
}

fn event(peer: &mut Peer, event: CanvasEvent) {
    peer.handle_canvas_event(event).unwrap();
}

fn press(peer: &mut Peer, x: f64, y: f64) {
    let pointer = Point::new(x, y);
    let target = peer.engine().object_at(pointer);
    event(peer, CanvasEvent::PointerDown { pointer, target });
}

fn move_to(peer: &mut Peer, x: f64, y: f64) {
    event(peer, CanvasEvent::PointerMove {
        pointer: Point::new(x, y),
    });
}

fn release(peer: &mut Peer, x: f64, y: f64) {
    event(peer, CanvasEvent::PointerUp {
        pointer: Point::new(x, y),
    });
}

fn draw_rect(peer: &mut Peer) -> ShapeId {
    peer.handle_tool_selection(ToolKind::Rectangle).unwrap();
    press(peer, 10.0, 10.0);
    move_to(peer, 110.0, 60.0);
    release(peer, 110.0, 60.0);
    *peer.engine().object_ids().last().unwrap()
}

fn pump(room: &LoopbackRoom, a: &mut Peer, b: &mut Peer) {
    room.pump(&mut [a, b]).unwrap();
}

fn left_of(peer: &Peer, id: ShapeId) -> f64 {
    peer.engine().object(id).unwrap().bounds().x0
}

fn fill_of(peer: &Peer, id: ShapeId) -> Option<String> {
    peer.engine().object(id).unwrap().style().fill.map(|c| c.to_hex())
}

/// Select, edit the fill in the panel, then deselect.
fn recolor(peer: &mut Peer, id: ShapeId, fill: &str) {
    event(peer, CanvasEvent::SelectionCreated { id });
    peer.edit_attribute("fill", fill).unwrap();
    peer.attribute_focus(false);
    event(peer, CanvasEvent::SelectionCleared);
}

#[test]
fn test_rectangle_draw_drag_undo() {
    let room = LoopbackRoom::new("scenario");
    let mut alice = join(&room);
    let mut bob = join(&room);

    let id = draw_rect(&mut alice);
    pump(&room, &mut alice, &mut bob);

    let record = alice.document().get(&id.to_string()).unwrap();
    assert_eq!(record.kind, ShapeKind::Rectangle);
    assert!((record.left - 10.0).abs() < f64::EPSILON);
    assert!((record.top - 10.0).abs() < f64::EPSILON);
    assert!((record.width - 100.0).abs() < f64::EPSILON);
    assert!((record.height - 50.0).abs() < f64::EPSILON);
    assert_eq!(bob.engine().serialize(id), Some(record));

    // Drag to (20, 20)
    press(&mut alice, 50.0, 30.0);
    move_to(&mut alice, 55.0, 35.0);
    release(&mut alice, 60.0, 40.0);
    pump(&room, &mut alice, &mut bob);

    let record = bob.document().get(&id.to_string()).unwrap();
    assert!((record.left - 20.0).abs() < f64::EPSILON);
    assert!((record.top - 20.0).abs() < f64::EPSILON);
    assert!((record.width - 100.0).abs() < f64::EPSILON);
    assert!((left_of(&bob, id) - 20.0).abs() < f64::EPSILON);

    // Undo reverts the drag everywhere
    alice
        .handle_key(&KeyEvent::new(Key::Character('z'), Modifiers::CTRL))
        .unwrap();
    pump(&room, &mut alice, &mut bob);
    assert!((left_of(&alice, id) - 10.0).abs() < f64::EPSILON);
    assert!((left_of(&bob, id) - 10.0).abs() < f64::EPSILON);

    // Bob has no history of his own: undo is a no-op for him
    bob.handle_key(&KeyEvent::new(Key::Character('z'), Modifiers::CTRL))
        .unwrap();
    pump(&room, &mut alice, &mut bob);
    assert_eq!(bob.engine().len(), 1);
}

#[test]
fn test_active_edit_is_protected() {
    let room = LoopbackRoom::new("protect");
    let mut alice = join(&room);
    let mut bob = join(&room);
    let id = draw_rect(&mut alice);
    pump(&room, &mut alice, &mut bob);

    // Bob grabs the shape and starts dragging it
    press(&mut bob, 20.0, 20.0);
    move_to(&mut bob, 70.0, 20.0);
    assert!((left_of(&bob, id) - 60.0).abs() < f64::EPSILON);

    // Alice recolors it meanwhile
    recolor(&mut alice, id, "#ff0000");
    pump(&room, &mut alice, &mut bob);

    // Bob's in-flight geometry and style are untouched
    let local = bob.engine().object(id).unwrap();
    assert!((local.bounds().x0 - 60.0).abs() < f64::EPSILON);
    assert_eq!(fill_of(&bob, id).as_deref(), Some("#aabbcc"));

    // Release: Bob's final state is pushed and both converge
    release(&mut bob, 70.0, 20.0);
    pump(&room, &mut alice, &mut bob);
    let a = alice.engine().serialize(id).unwrap();
    let b = bob.engine().serialize(id).unwrap();
    assert_eq!(a, b);
    assert!((a.left - 60.0).abs() < f64::EPSILON);
}

#[test]
fn test_selected_object_is_protected() {
    let room = LoopbackRoom::new("selected");
    let mut alice = join(&room);
    let mut bob = join(&room);
    let id = draw_rect(&mut alice);
    pump(&room, &mut alice, &mut bob);

    event(&mut bob, CanvasEvent::SelectionCreated { id });
    assert_eq!(bob.interaction().active_object, Some(id));

    recolor(&mut alice, id, "#ff0000");
    pump(&room, &mut alice, &mut bob);
    assert_eq!(fill_of(&bob, id).as_deref(), Some("#aabbcc"));
    assert_eq!(bob.current_attributes().fill, "#aabbcc");

    // Deselecting applies what was held back
    event(&mut bob, CanvasEvent::SelectionCleared);
    assert_eq!(bob.interaction().active_object, None);
    assert_eq!(fill_of(&bob, id).as_deref(), Some("#ff0000"));
    assert_eq!(alice.engine().serialize(id), bob.engine().serialize(id));
}

#[test]
fn test_remote_update_mid_scale() {
    let room = LoopbackRoom::new("scale");
    let mut alice = join(&room);
    let mut bob = join(&room);
    let id = draw_rect(&mut alice);
    pump(&room, &mut alice, &mut bob);

    // Bob is dragging a scale handle
    assert!(bob.engine_mut().set_property(id, "width", "150").unwrap());
    event(&mut bob, CanvasEvent::ObjectScaling { id });
    assert_eq!(bob.interaction().active_object, Some(id));
    assert_eq!(bob.current_attributes().width, "150");

    recolor(&mut alice, id, "#ff0000");
    pump(&room, &mut alice, &mut bob);

    let local = bob.engine().serialize(id).unwrap();
    assert!((local.width - 150.0).abs() < f64::EPSILON);
    assert_eq!(local.fill.as_deref(), Some("#aabbcc"));

    // The scale ends: Bob's object is pushed and both sides converge
    event(&mut bob, CanvasEvent::ObjectModified { id });
    assert_eq!(bob.interaction().active_object, None);
    pump(&room, &mut alice, &mut bob);
    let a = alice.engine().serialize(id).unwrap();
    assert_eq!(Some(&a), bob.engine().serialize(id).as_ref());
    assert!((a.width - 150.0).abs() < f64::EPSILON);
    assert_eq!(a.fill.as_deref(), Some("#aabbcc"));
}

#[test]
fn test_reset_completeness() {
    let room = LoopbackRoom::new("reset");
    let mut alice = join(&room);
    let mut bob = join(&room);
    draw_rect(&mut alice);
    draw_rect(&mut bob);
    pump(&room, &mut alice, &mut bob);
    assert_eq!(alice.engine().len(), 2);

    alice.handle_tool_selection(ToolKind::Reset).unwrap();
    assert!(alice.document().is_empty());
    assert!(alice.engine().is_empty());

    pump(&room, &mut alice, &mut bob);
    assert!(bob.document().is_empty());
    assert!(bob.engine().is_empty());
}

#[test]
fn test_late_joiner_catches_up() {
    let room = LoopbackRoom::new("late");
    let mut alice = join(&room);
    let id = draw_rect(&mut alice);
    alice.poll().unwrap();

    let mut carol = join(&room);
    pump(&room, &mut alice, &mut carol);
    assert!(carol.engine().contains(id));
    assert_eq!(carol.layers(), vec![(id.to_string(), ShapeKind::Rectangle)]);
}

#[test]
fn test_two_clients_reactions() {
    let room = LoopbackRoom::new("party");
    let mut alice = join(&room);
    let mut bob = join(&room);

    for peer in [&mut alice, &mut bob] {
        peer.handle_key(&KeyEvent::char('e')).unwrap();
        assert_eq!(peer.cursor_state(), &CursorState::ReactionSelector);
        peer.select_reaction("🎉");
        press(peer, 40.0, 40.0);
    }

    // Both emit on the same tick
    alice.advance(100);
    bob.advance(100);
    pump(&room, &mut alice, &mut bob);
    alice.advance(100);

    for peer in [&alice, &bob] {
        assert_eq!(peer.reactions().len(), 2);
        assert!(peer.reactions().iter().all(|r| r.value == "🎉"));
    }
    assert!(alice.document().is_empty());

    for peer in [&mut alice, &mut bob] {
        release(peer, 40.0, 40.0);
        peer.advance(4099);
        assert_eq!(peer.reactions().len(), 2);
        peer.advance(5000);
        assert!(peer.reactions().is_empty());
    }
}

#[test]
fn test_cursors_and_chat_between_peers() {
    let room = LoopbackRoom::new("chat");
    let mut alice = join(&room);
    let mut bob = join(&room);

    move_to(&mut alice, 12.0, 34.0);
    alice.handle_key(&KeyEvent::char('/')).unwrap();
    for c in "hello".chars() {
        alice.handle_key(&KeyEvent::char(c)).unwrap();
    }

    let overlays = bob.cursor_overlays();
    assert_eq!(overlays.len(), 1);
    assert_eq!(overlays[0].cursor, CursorPosition { x: 12.0, y: 34.0 });
    assert_eq!(overlays[0].message.as_deref(), Some("hello"));
    assert_eq!(bob.active_users_list().names.len(), 2);

    alice.handle_key(&KeyEvent::plain(Key::Escape)).unwrap();
    assert_eq!(bob.cursor_overlays()[0].message, None);

    event(&mut alice, CanvasEvent::PointerLeave);
    assert!(bob.cursor_overlays().is_empty());

    alice.close();
    assert!(bob.transport().unwrap().others().is_empty());
    assert_eq!(bob.active_users_list().names, vec!["You".to_string()]);
}
