//! Integration tests: hit queries through nested, transformed render nodes.

use pf_core::kurbo::Point;
use pf_core::{Bitmap, Color};
use pf_render::graph::{Placement, RenderGraph, RenderNode};
use pf_render::{nodes_at, sample_alpha};
use pretty_assertions::assert_eq;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

fn opaque(w: u32, h: u32) -> Arc<Bitmap> {
    Arc::new(Bitmap::filled(w, h, [200, 200, 200, 255]).unwrap())
}

#[test]
fn child_inherits_parent_rotation_and_scale() {
    let mut graph = RenderGraph::new();
    let root = graph.root();
    let parent = graph.add_child(root, RenderNode::sprite("parent-EDT-", opaque(20, 20))).unwrap();
    let child = graph.add_child(parent, RenderNode::sprite("child-EDT-", opaque(4, 4))).unwrap();
    {
        let p = graph.get_mut(parent).unwrap();
        p.position = Point::new(50.0, 50.0);
        p.rotation = FRAC_PI_2;
        p.scale_x = 2.0;
        p.scale_y = 2.0;
    }
    graph.get_mut(child).unwrap().position = Point::new(30.0, 0.0);
    graph.get_mut(child).unwrap().paint_order = 1;

    // Local (30, 0) under a quarter turn and 2x scale lands at (50, 110).
    let hits = nodes_at(&graph, Point::new(50.0, 110.0));
    assert_eq!(hits, vec![child]);
    assert_eq!(sample_alpha(&graph, child, Point::new(50.0, 110.0)), Some(255));

    // The child's image covers 8x8 scene units after the parent's scale.
    assert_eq!(nodes_at(&graph, Point::new(53.0, 113.0)), vec![child]);
    assert!(nodes_at(&graph, Point::new(55.0, 115.0)).is_empty());
}

#[test]
fn detached_child_keeps_its_screen_spot() {
    let mut graph = RenderGraph::new();
    let root = graph.root();
    let parent = graph.add_child(root, RenderNode::sprite("parent-EDT-", opaque(10, 10))).unwrap();
    let child = graph.add_child(parent, RenderNode::sprite("child-EDT-", opaque(2, 2))).unwrap();
    graph.get_mut(parent).unwrap().position = Point::new(-40.0, 12.0);
    graph.get_mut(parent).unwrap().rotation = 0.4;
    graph.get_mut(child).unwrap().position = Point::new(25.0, -3.0);

    let before = graph.world_placement(child);
    assert!(graph.reparent(child, root, Placement::KeepWorld));
    let after = graph.world_placement(child);
    assert!((before.position - after.position).hypot() < 1e-9);
    assert!((before.rotation - after.rotation).abs() < 1e-9);

    // Removing the old parent no longer takes the child with it.
    graph.remove(parent);
    assert!(graph.contains(child));
    assert_eq!(nodes_at(&graph, after.position), vec![child]);
}

#[test]
fn indicator_outranks_every_sprite_under_it() {
    let mut graph = RenderGraph::new();
    let root = graph.root();
    let sprite = graph.add_child(root, RenderNode::sprite("a-EDT-", opaque(40, 40))).unwrap();
    let child = graph.add_child(sprite, RenderNode::sprite("b-EDT-", opaque(40, 40))).unwrap();
    graph.get_mut(child).unwrap().paint_order = 7;
    let indicator = graph
        .add_child(sprite, RenderNode::anchor_indicator(Color::MAGENTA, 45.0))
        .unwrap();

    assert_eq!(nodes_at(&graph, Point::ZERO), vec![indicator, child, sprite]);
}
