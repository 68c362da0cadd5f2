//! Static SVG preview of a snapshot, for inspecting a layout without the
//! interactive front end.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use crate::engine::{GraphSnapshot, Node};
use crate::error::Result;
use crate::routing::floating_endpoints;
use crate::style::{EdgeKind, StyledEdge};
use crate::utils::{escape_xml, format_number};
use crate::*;

const NODE_BASE_RADIUS: f64 = 40.0;
const NODE_RADIUS_SCALE: f64 = 35.0;
const LAYOUT_MARGIN: f64 = 80.0;
const GLYPH_STROKE_WIDTH: f64 = 4.0;
const NODE_FILL: &str = "#e2e8f0";

/// Bubble radius; more important characters get bigger bubbles.
pub fn node_radius(importance: f64) -> f64 {
    NODE_BASE_RADIUS + importance * NODE_RADIUS_SCALE
}

struct Bounds {
    shift_x: f64,
    shift_y: f64,
    width: f64,
    height: f64,
}

fn align_bounds(nodes: &[Node]) -> Bounds {
    if nodes.is_empty() {
        let side = LAYOUT_MARGIN * 2.0 + NODE_BASE_RADIUS * 2.0;
        return Bounds {
            shift_x: 0.0,
            shift_y: 0.0,
            width: side,
            height: side,
        };
    }

    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;

    for node in nodes {
        let radius = node_radius(node.entity.importance);
        let position = node.position();
        min_x = min_x.min(position.x - radius);
        max_x = max_x.max(position.x + radius);
        min_y = min_y.min(position.y - radius);
        max_y = max_y.max(position.y + radius);
    }

    Bounds {
        shift_x: LAYOUT_MARGIN - min_x,
        shift_y: LAYOUT_MARGIN - min_y,
        width: (max_x - min_x) + LAYOUT_MARGIN * 2.0,
        height: (max_y - min_y) + LAYOUT_MARGIN * 2.0,
    }
}

pub fn render_svg(snapshot: &GraphSnapshot, background: &str) -> Result<String> {
    let bounds = align_bounds(&snapshot.nodes);
    let shift = |p: Point| Point::new(p.x + bounds.shift_x, p.y + bounds.shift_y);

    let mut svg = String::new();
    write!(
        svg,
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Inter, system-ui, sans-serif">
  <defs>
    <filter id="grayscale">
      <feColorMatrix type="saturate" values="0" />
    </filter>
  </defs>
  <rect width="100%" height="100%" fill="{}" />
"##,
        escape_xml(background),
        w = format_number(bounds.width),
        h = format_number(bounds.height),
    )?;

    let nodes_by_id: HashMap<&str, &Node> = snapshot.nodes.iter().map(|n| (n.id(), n)).collect();

    for edge in snapshot.renderable_edges() {
        let (Some(source), Some(target)) = (
            nodes_by_id.get(edge.source.as_str()),
            nodes_by_id.get(edge.target.as_str()),
        ) else {
            continue;
        };
        write_edge(&mut svg, edge, source, target, &shift)?;
    }

    for node in &snapshot.nodes {
        write_node(&mut svg, node, shift(node.position()))?;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn write_edge(
    svg: &mut String,
    edge: &StyledEdge,
    source: &Node,
    target: &Node,
    shift: &dyn Fn(Point) -> Point,
) -> Result<()> {
    let Some(style) = &edge.style else {
        return Ok(());
    };

    let params = floating_endpoints(
        shift(source.position()),
        node_radius(source.entity.importance),
        shift(target.position()),
        node_radius(target.entity.importance),
    );

    // Animated edges have no stroke of their own; draw the glyph track instead.
    let (stroke_width, dash) = match edge.kind {
        EdgeKind::Battle => (GLYPH_STROKE_WIDTH, None),
        EdgeKind::Friendship => (GLYPH_STROKE_WIDTH, Some("8,4")),
        EdgeKind::Plain => (style.stroke_width, style.stroke_dasharray.as_deref()),
    };
    let dash_attr = dash
        .map(|d| format!(" stroke-dasharray=\"{}\"", escape_xml(d)))
        .unwrap_or_default();

    writeln!(
        svg,
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\" data-edge=\"{}\" data-kind=\"{}\"{} />",
        format_number(params.sx),
        format_number(params.sy),
        format_number(params.tx),
        format_number(params.ty),
        escape_xml(&style.stroke),
        format_number(stroke_width),
        style.opacity,
        escape_xml(&edge.id),
        edge.kind.as_str(),
        dash_attr
    )?;
    Ok(())
}

fn write_node(svg: &mut String, node: &Node, center: Point) -> Result<()> {
    let radius = node_radius(node.entity.importance);
    let filter_attr = if node.grayscale {
        " filter=\"url(#grayscale)\""
    } else {
        ""
    };

    writeln!(
        svg,
        "  <g opacity=\"{}\" data-node=\"{}\" data-mood=\"{}\"{}>",
        node.opacity,
        escape_xml(node.id()),
        node.mood.as_str(),
        filter_attr
    )?;
    writeln!(
        svg,
        "    <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"white\" stroke-width=\"4\" />",
        format_number(center.x),
        format_number(center.y),
        format_number(radius),
        NODE_FILL
    )?;
    writeln!(
        svg,
        "    <text x=\"{}\" y=\"{}\" fill=\"#000000\" font-size=\"{}\" font-weight=\"800\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
        format_number(center.x),
        format_number(center.y),
        format_number(radius * 2.0 / 7.0),
        escape_xml(&node.entity.label)
    )?;
    svg.push_str("  </g>\n");
    Ok(())
}
