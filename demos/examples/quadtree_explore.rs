// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive a quadtree the way an interactive viewer would.
//!
//! The viewer itself (drawing, input) is not part of this crate. This example
//! plays its role: it scatters random points, runs a range query and reports
//! which regions were touched, looks a point up and prints its search path,
//! and locates the region under a "cursor".
//!
//! Run:
//! - `cargo run -p understory_demos --example quadtree_explore`
//! - `RUST_LOG=debug cargo run -p understory_demos --example quadtree_explore` to see subdivisions.

use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_quadtree::{NodeId, Quadtree, Rectangle};

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;

fn describe(tree: &Quadtree<u32>, id: NodeId) -> String {
    match tree.node(id) {
        Some(node) => format!(
            "{} depth {} ({} points{})",
            node.boundary(),
            node.depth(),
            node.points().len(),
            if node.is_divided() { ", divided" } else { "" }
        ),
        None => "<stale>".to_owned(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut tree: Quadtree<u32> =
        Quadtree::new(0.0, 0.0, WIDTH, HEIGHT, 4).expect("static boundary is valid");

    // Scatter points in batches of 20, like the viewer's "random" key.
    let mut rng = rand::rngs::StdRng::seed_from_u64(2025);
    let mut next = 0_u32;
    for _ in 0..5 {
        for _ in 0..20 {
            let x = rng.random_range(0.0..WIDTH);
            let y = rng.random_range(0.0..HEIGHT);
            if tree.insert(x, y, Some(next)) {
                next += 1;
            }
        }
    }
    info!(
        points = tree.len(),
        nodes = tree.node_count(),
        depth = tree.depth(),
        "tree built"
    );

    // A click outside the region is rejected without touching the tree.
    assert!(!tree.insert(WIDTH + 10.0, 10.0, None));

    // Shift-drag selection.
    let selection = Rectangle::new(100.0, 100.0, 250.0, 180.0);
    let visited = {
        let result = tree.query(&selection);
        info!(
            matched = result.len(),
            visited = result.visited.len(),
            "range query {selection}"
        );
        // Keep only the node ids; the matches borrow the tree.
        result.visited
    };
    for (id, _) in tree.nodes_depth_first() {
        if visited.contains(&id) {
            info!("  visited {}", describe(&tree, id));
        }
    }

    // Search mode: look up the first point and show the path taken.
    let target = tree.all_points()[0].pos();
    let trace = tree.find(target.x, target.y);
    match trace.hit() {
        Some(hit) => info!(
            payload = ?hit.point.data(),
            "found {} in {}",
            hit.point,
            describe(&tree, hit.leaf)
        ),
        None => info!(miss = %trace.outcome.unwrap_err(), "lookup failed"),
    }
    for (step, id) in trace.path.iter().enumerate() {
        info!("  step {step}: {}", describe(&tree, *id));
    }

    // Hover feedback: highlight the branch leading to the node under the cursor.
    let cursor = kurbo::Point::new(WIDTH * 0.7, HEIGHT * 0.2);
    if let Some(hovered) = tree.locate(cursor.x, cursor.y) {
        info!("cursor {cursor:?} over {}", describe(&tree, hovered));
        let branch = tree
            .nodes_depth_first()
            .filter(|(id, _)| tree.any_in_subtree(*id, |n| n == hovered))
            .count();
        info!("{branch} nodes on the highlighted branch");
    }

    // Reset.
    let stale = tree.root();
    tree.clear();
    info!(
        stale_root_alive = tree.is_alive(stale),
        nodes = tree.node_count(),
        "tree cleared"
    );
}
