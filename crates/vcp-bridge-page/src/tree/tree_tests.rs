use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sample() -> MemoryDom {
    MemoryDom::page(
        "Sample",
        vec![
            el("div")
                .id("outer")
                .cursor("pointer")
                .child(el("span").id("inner").text("hi")),
            el("my-widget")
                .id("host")
                .shadow(vec![el("button").id("shadow-btn").text("Go")]),
        ],
    )
}

#[test]
fn test_body_and_title() {
    let dom = sample();
    let body = dom.body().unwrap();
    assert_eq!(dom.tag(body), Some("body"));
    assert_eq!(dom.title(), "Sample");
}

#[test]
fn test_descendants_pierce_shadow_roots() {
    let dom = sample();
    let found = dom.find_by_attribute("id", "shadow-btn").unwrap();
    assert_eq!(dom.tag(found), Some("button"));

    let host = dom.find_by_attribute("id", "host").unwrap();
    let shadow = dom.shadow_root(host).unwrap();
    assert_eq!(dom.kind(shadow).unwrap(), NodeKind::ShadowRoot);
    assert_eq!(dom.parent(shadow), Some(host));
}

#[test]
fn test_cursor_is_inherited() {
    let dom = sample();
    let inner = dom.find_by_attribute("id", "inner").unwrap();
    assert_eq!(dom.computed_style(inner).unwrap().cursor, "pointer");

    let host = dom.find_by_attribute("id", "host").unwrap();
    assert_eq!(dom.computed_style(host).unwrap().cursor, "auto");
}

#[test]
fn test_visibility_is_inherited_but_opacity_is_not() {
    let dom = MemoryDom::page(
        "t",
        vec![el("div")
            .visibility(Visibility::Hidden)
            .opacity(0.0)
            .child(el("p").id("p"))],
    );
    let p = dom.find_by_attribute("id", "p").unwrap();
    let style = dom.computed_style(p).unwrap();
    assert_eq!(style.visibility, Visibility::Hidden);
    assert_eq!(style.opacity, 1.0);
}

#[test]
fn test_default_display_by_tag() {
    let dom = MemoryDom::page(
        "t",
        vec![el("div").id("d"), el("span").id("s"), el("script").id("x")],
    );
    let style = |id: &str| {
        let n = dom.find_by_attribute("id", id).unwrap();
        dom.computed_style(n).unwrap().display
    };
    assert_eq!(style("d"), Display::Block);
    assert_eq!(style("s"), Display::Inline);
    assert_eq!(style("x"), Display::None);
}

#[test]
fn test_style_unavailable() {
    let dom = MemoryDom::page("t", vec![el("div").id("d").style_unavailable("detached")]);
    let d = dom.find_by_attribute("id", "d").unwrap();
    assert!(matches!(
        dom.computed_style(d),
        Err(TreeError::StyleUnavailable { .. })
    ));
}

#[test]
fn test_text_node_has_no_style() {
    let dom = sample();
    let inner = dom.find_by_attribute("id", "inner").unwrap();
    let text = dom.children(inner)[0];
    assert_eq!(dom.kind(text).unwrap(), NodeKind::Text("hi"));
    assert_eq!(dom.computed_style(text), Err(TreeError::NotElement(text)));
}

#[test]
fn test_click_bubbles_across_shadow_host() {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = hits.clone();

    let mut dom = sample();
    let host = dom.find_by_attribute("id", "host").unwrap();
    dom.add_event_listener(host, "click", move |event| {
        assert_eq!(event.current_target(), host);
        assert_eq!(event.event_type, "click");
        seen.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    let button = dom.find_by_attribute("id", "shadow-btn").unwrap();
    let not_cancelled = dom
        .dispatch_mouse_event(button, &MouseEventInit::click())
        .unwrap();
    assert!(not_cancelled);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_non_bubbling_event_stays_on_target() {
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = hits.clone();

    let mut dom = sample();
    let outer = dom.find_by_attribute("id", "outer").unwrap();
    dom.add_event_listener(outer, "click", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    let inner = dom.find_by_attribute("id", "inner").unwrap();
    let init = MouseEventInit {
        bubbles: false,
        ..MouseEventInit::click()
    };
    dom.dispatch_mouse_event(inner, &init).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_prevent_default_reports_cancelled() {
    let mut dom = MemoryDom::page(
        "t",
        vec![el("a").id("a").on("click", |event| event.prevent_default())],
    );
    let a = dom.find_by_attribute("id", "a").unwrap();
    assert!(!dom.dispatch_mouse_event(a, &MouseEventInit::click()).unwrap());
}

#[test]
fn test_edit_journal_records_writes() {
    let mut dom = sample();
    let inner = dom.find_by_attribute("id", "inner").unwrap();

    dom.set_attribute(inner, "data-x", "1").unwrap();
    assert!(dom.take_edits().is_empty());

    dom.record_edits();
    dom.set_attribute(inner, "vcp-id", "vcp-id-1").unwrap();
    dom.focus(inner).unwrap();
    dom.remove_attribute(inner, "vcp-id").unwrap();

    let edits = dom.take_edits();
    assert_eq!(edits.len(), 3);
    assert_eq!(
        edits[0],
        DomEdit::SetAttribute {
            node: inner,
            name: "vcp-id".to_string(),
            value: "vcp-id-1".to_string()
        }
    );
    assert_eq!(dom.active_element(), Some(inner));
    assert!(dom.take_edits().is_empty());
}

#[test]
fn test_edit_serializes_with_op_tag() {
    let edit = DomEdit::SetValue {
        node: NodeId(4),
        value: "x".to_string(),
    };
    let json = serde_json::to_value(&edit).unwrap();
    assert_eq!(json["op"], "setValue");
    assert_eq!(json["node"], 4);
}

#[test]
fn test_set_value_overrides_attribute() {
    let mut dom = MemoryDom::page("t", vec![el("input").id("i").attr("value", "old")]);
    let input = dom.find_by_attribute("id", "i").unwrap();
    assert_eq!(dom.value(input), Some("old"));
    dom.set_value(input, "new").unwrap();
    assert_eq!(dom.value(input), Some("new"));
}

#[test]
fn test_append_and_remove() {
    let mut dom = sample();
    let body = dom.body().unwrap();
    let added = dom.append(body, el("p").id("late")).unwrap();
    assert_eq!(dom.find_by_attribute("id", "late"), Some(added));

    dom.remove(added).unwrap();
    assert!(dom.find_by_attribute("id", "late").is_none());
    assert!(dom.append(NodeId(999), el("p")).is_err());
}

#[test]
fn test_from_snapshot_keeps_indices() {
    let json = serde_json::json!({
        "title": "Snap",
        "nodes": [
            {"kind": "document"},
            {"kind": "element", "parent": 0, "tag": "HTML",
             "style": {"display": "block", "visibility": "visible", "opacity": "1", "cursor": "auto"}},
            {"kind": "element", "parent": 1, "tag": "BODY",
             "style": {"display": "block", "visibility": "visible", "opacity": "1", "cursor": "auto"}},
            {"kind": "element", "parent": 2, "tag": "button", "attrs": [["id", "b"]],
             "style": {"display": "inline-block", "visibility": "visible", "opacity": "0.5",
                       "cursor": "pointer", "width": 80.0, "height": 20.0}},
            {"kind": "text", "parent": 3, "text": "Submit"},
            {"kind": "shadow-root", "parent": 3},
            {"kind": "element", "parent": 2, "tag": "div"}
        ]
    });
    let snapshot: DomSnapshot = serde_json::from_value(json).unwrap();
    let dom = MemoryDom::from_snapshot(&snapshot).unwrap();

    assert_eq!(dom.title(), "Snap");
    assert_eq!(dom.body(), Some(NodeId(2)));
    assert_eq!(dom.find_by_attribute("id", "b"), Some(NodeId(3)));
    assert_eq!(dom.shadow_root(NodeId(3)), Some(NodeId(5)));
    assert_eq!(dom.children(NodeId(3)), &[NodeId(4)]);

    let style = dom.computed_style(NodeId(3)).unwrap();
    assert_eq!(style.display, Display::InlineBlock);
    assert_eq!(style.opacity, 0.5);
    assert_eq!(style.width, Some(80.0));

    assert!(matches!(
        dom.computed_style(NodeId(6)),
        Err(TreeError::StyleUnavailable { .. })
    ));
}

#[test]
fn test_from_snapshot_rejects_forward_parent() {
    let snapshot = DomSnapshot {
        title: String::new(),
        nodes: vec![
            SnapshotNode {
                kind: SnapshotKind::Document,
                parent: None,
                tag: None,
                text: None,
                attrs: vec![],
                value: None,
                style: None,
            },
            SnapshotNode {
                kind: SnapshotKind::Element,
                parent: Some(5),
                tag: Some("div".to_string()),
                text: None,
                attrs: vec![],
                value: None,
                style: None,
            },
        ],
    };
    assert!(MemoryDom::from_snapshot(&snapshot).is_err());
}

#[test]
fn test_display_parse() {
    assert_eq!(Display::parse("none"), Display::None);
    assert_eq!(Display::parse(" Flex "), Display::Flex);
    assert_eq!(Display::parse("block flow"), Display::Block);
    assert_eq!(Display::parse("table-cell"), Display::Other);
    assert!(Display::Grid.is_block_like());
    assert!(!Display::InlineFlex.is_block_like());
}

#[test]
fn test_zero_size_requires_both_dimensions() {
    let mut style = ComputedStyle::default();
    assert!(!style.is_zero_size());
    style.width = Some(0.0);
    style.height = Some(10.0);
    assert!(!style.is_zero_size());
    style.height = Some(0.0);
    assert!(style.is_zero_size());
}
